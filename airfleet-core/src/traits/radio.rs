//! Short-range radio used by the display link
//!
//! The radio is driven by non-blocking requests. Outcomes come back as
//! [`RadioEvent`]s which the link drains at the top of its service call;
//! pairing and connection state are polled.

use airfleet_protocol::link::{PeerAddress, Uuid};

/// Radio errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// No peer connected
    NotConnected,
    /// The write could not be queued or was refused
    WriteFailed,
    /// Payload exceeds what the channel accepts
    PayloadTooLarge,
}

/// Handle to a resolved remote channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelHandle(pub u8);

/// Asynchronous radio outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioEvent {
    /// A peer advertised the given service
    Advertisement { address: PeerAddress, service: Uuid },
    /// Scanning ended without a connect request
    ScanStopped,
    /// A connect request succeeded
    Connected,
    /// A connect request failed
    ConnectFailed,
    /// The connected peer went away
    Disconnected,
}

pub trait LinkRadio {
    fn power_on(&mut self);

    fn power_off(&mut self);

    fn start_scan(&mut self);

    fn stop_scan(&mut self);

    /// Request a connection; the outcome arrives as an event
    fn connect(&mut self, address: PeerAddress);

    fn disconnect(&mut self);

    /// Resolve a remote channel by identifier on the connected peer
    fn channel(&self, id: &Uuid) -> Option<ChannelHandle>;

    fn start_pairing(&mut self);

    fn is_pairing(&self) -> bool;

    fn is_connected(&self) -> bool;

    fn write(&mut self, channel: ChannelHandle, data: &[u8]) -> Result<(), RadioError>;

    fn poll_event(&mut self) -> Option<RadioEvent>;
}
