//! Link session state machine

/// Display link states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Radio off; left only by an explicit power-up
    Idle,
    /// Looking for an advertisement of the display service
    Scanning,
    /// Connect request outstanding
    Connecting,
    /// Connected, pairing in progress
    Pairing,
    /// Paired and reconciled; writes go straight through
    Ready,
    /// Backing off before the next scan
    Waiting,
}

/// Inputs to the link state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    PowerOn,
    PowerOff,
    /// Matching advertisement seen
    PeerFound,
    /// Scan ended without a match
    ScanStopped,
    Connected,
    ConnectFailed,
    /// Connection lost, channels missing, or a write failed
    ConnectionLost,
    PairingComplete,
    BackoffElapsed,
}

impl LinkState {
    /// Whether a peer connection exists in this state
    pub fn is_connected(&self) -> bool {
        matches!(self, LinkState::Pairing | LinkState::Ready)
    }

    pub fn transition(self, event: LinkEvent) -> Self {
        use LinkEvent::*;
        use LinkState::*;

        match (self, event) {
            (_, PowerOff) => Idle,
            (Idle, PowerOn) => Scanning,

            (Scanning, PeerFound) => Connecting,
            (Scanning, ScanStopped) => Waiting,

            (Connecting, Connected) => Pairing,
            (Connecting, ConnectFailed) => Waiting,

            (Pairing, PairingComplete) => Ready,

            (Connecting | Pairing | Ready, ConnectionLost) => Waiting,

            (Waiting, BackoffElapsed) => Scanning,

            _ => self,
        }
    }
}
