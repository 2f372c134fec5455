//! Reconnecting display link client
//!
//! Discovers the display by its advertised service, connects, resolves the
//! four channels, pairs and then keeps the remote in step with the
//! [`DisplayCache`]. Every public operation updates the cache first; the
//! radio is only touched when the link is `Ready`. On each (re)entry into
//! `Ready` the cache is replayed so the remote converges on its own.

use airfleet_protocol::link::{
    encode_clear, encode_print, Channel, FlashDescriptor, PeerAddress, DISPLAY_COLS,
    DISPLAY_ROWS, SERVICE_UUID,
};

use super::cache::DisplayCache;
use super::state::{LinkEvent, LinkState};
use crate::traits::{ChannelHandle, LinkRadio, RadioError, RadioEvent};

/// Default pause between a lost connection and the next scan
pub const DEFAULT_BACKOFF_MS: u32 = 5_000;

/// Link errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Cache updated, but the link cannot transmit right now
    NotReady,
    /// A zero interval is the disable encoding; use `disable_flash`
    InvalidInterval,
    /// Coordinates outside the 20x4 grid
    OutOfBounds,
    /// The radio refused a write; the session was dropped
    Radio(RadioError),
}

/// Outcome of a successful operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Update {
    /// Cache already held this content; nothing sent
    Unchanged,
    /// Payload of this many bytes transmitted
    Sent(usize),
}

/// Per-connection data, dropped on disconnect
#[derive(Debug, Clone, Copy, Default)]
struct Session {
    peer: Option<PeerAddress>,
    pairing_since_ms: u32,
    channels: [Option<ChannelHandle>; 4],
}

pub struct DisplayLink<R> {
    radio: R,
    state: LinkState,
    since_ms: u32,
    /// Time of the latest `service` call
    now_ms: u32,
    backoff_ms: u32,
    session: Session,
    cache: DisplayCache,
}

impl<R: LinkRadio> DisplayLink<R> {
    pub fn new(radio: R, backoff_ms: u32) -> Self {
        Self {
            radio,
            state: LinkState::Idle,
            since_ms: 0,
            now_ms: 0,
            backoff_ms,
            session: Session::default(),
            cache: DisplayCache::new(),
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == LinkState::Ready
    }

    pub fn cache(&self) -> &DisplayCache {
        &self.cache
    }

    pub fn peer(&self) -> Option<PeerAddress> {
        self.session.peer
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Power the radio up with a blank cache and start scanning
    pub fn power_on(&mut self, now_ms: u32) {
        if self.state != LinkState::Idle {
            self.power_off();
        }
        self.now_ms = now_ms;
        self.radio.power_on();
        self.cache.reset();
        self.apply(LinkEvent::PowerOn, now_ms);
        self.radio.start_scan();
    }

    pub fn power_off(&mut self) {
        if self.state.is_connected() || self.state == LinkState::Connecting {
            self.radio.disconnect();
        }
        self.radio.power_off();
        self.session = Session::default();
        self.apply(LinkEvent::PowerOff, self.now_ms);
    }

    /// Drain radio events and advance the session
    pub fn service(&mut self, now_ms: u32) {
        self.now_ms = now_ms;
        while let Some(event) = self.radio.poll_event() {
            self.on_radio_event(event, now_ms);
        }

        match self.state {
            LinkState::Waiting => {
                if now_ms.wrapping_sub(self.since_ms) >= self.backoff_ms {
                    self.apply(LinkEvent::BackoffElapsed, now_ms);
                    self.radio.start_scan();
                }
            }
            LinkState::Pairing => {
                if !self.radio.is_connected() {
                    self.lose_connection(now_ms);
                } else if !self.radio.is_pairing() {
                    debug!(
                        "display paired after {} ms",
                        now_ms.wrapping_sub(self.session.pairing_since_ms)
                    );
                    self.apply(LinkEvent::PairingComplete, now_ms);
                    self.reconcile();
                }
            }
            LinkState::Ready => {
                if !self.radio.is_connected() {
                    self.lose_connection(now_ms);
                }
            }
            LinkState::Idle | LinkState::Scanning | LinkState::Connecting => {}
        }
    }

    /// Blank the display
    pub fn clear(&mut self) -> Result<Update, LinkError> {
        if !self.cache.clear() {
            return Ok(Update::Unchanged);
        }
        self.send(Channel::Clear, &encode_clear())
    }

    /// Print `text` at `(x, y)`; only changed content is transmitted
    pub fn print(&mut self, x: u8, y: u8, text: &[u8]) -> Result<Update, LinkError> {
        let changed = self
            .cache
            .write(x, y, text)
            .map_err(|_| LinkError::OutOfBounds)?;
        if changed == 0 {
            return Ok(Update::Unchanged);
        }
        self.send(Channel::Print, &encode_print(x, y, text))
    }

    /// Flash `text` at `(x, y)`, toggling every `interval_ms`
    pub fn enable_flash(
        &mut self,
        x: u8,
        y: u8,
        text: &[u8],
        interval_ms: u16,
    ) -> Result<Update, LinkError> {
        if interval_ms == 0 {
            return Err(LinkError::InvalidInterval);
        }
        if x as usize >= DISPLAY_COLS || y as usize >= DISPLAY_ROWS {
            return Err(LinkError::OutOfBounds);
        }
        self.set_flash(FlashDescriptor::new(x, y, interval_ms, text))
    }

    pub fn disable_flash(&mut self) -> Result<Update, LinkError> {
        self.set_flash(FlashDescriptor::disabled())
    }

    fn set_flash(&mut self, flash: FlashDescriptor) -> Result<Update, LinkError> {
        let payload = flash.encode();
        if !self.cache.set_flash(flash) {
            return Ok(Update::Unchanged);
        }
        self.send(Channel::Flash, &payload)
    }

    fn send(&mut self, channel: Channel, payload: &[u8]) -> Result<Update, LinkError> {
        if self.state != LinkState::Ready {
            return Err(LinkError::NotReady);
        }
        self.write(channel, payload)?;
        Ok(Update::Sent(payload.len()))
    }

    /// Write to a resolved channel; a failed write drops the session
    fn write(&mut self, channel: Channel, payload: &[u8]) -> Result<(), LinkError> {
        let handle = self.session.channels[channel.index()].ok_or(LinkError::NotReady)?;
        if let Err(err) = self.radio.write(handle, payload) {
            warn!("display write on {} failed: {}", channel, err);
            self.radio.disconnect();
            self.lose_connection(self.now_ms);
            return Err(LinkError::Radio(err));
        }
        Ok(())
    }

    /// Replay the cache onto a freshly paired remote
    fn reconcile(&mut self) {
        // A failed write has already dropped the link back to Waiting
        let result = if self.cache.is_blank() {
            self.write(Channel::Clear, &encode_clear())
        } else {
            (0..DISPLAY_ROWS).try_for_each(|y| {
                let row = self.cache.row(y).copied().unwrap_or([b' '; DISPLAY_COLS]);
                self.write(Channel::Print, &encode_print(0, y as u8, &row))
            })
        };
        let result = result.and_then(|()| {
            let flash = self.cache.flash();
            if flash.is_enabled() {
                let payload = flash.encode();
                self.write(Channel::Flash, &payload)
            } else {
                Ok(())
            }
        });
        if result.is_ok() {
            debug!("display reconciled");
        }
    }

    fn on_radio_event(&mut self, event: RadioEvent, now_ms: u32) {
        trace!("radio event {}", event);
        match (self.state, event) {
            (LinkState::Scanning, RadioEvent::Advertisement { address, service })
                if service == SERVICE_UUID =>
            {
                self.radio.stop_scan();
                self.session.peer = Some(address);
                self.radio.connect(address);
                self.apply(LinkEvent::PeerFound, now_ms);
            }
            (LinkState::Scanning, RadioEvent::ScanStopped) => {
                self.apply(LinkEvent::ScanStopped, now_ms);
            }
            (LinkState::Connecting, RadioEvent::Connected) => self.on_connected(now_ms),
            (LinkState::Connecting, RadioEvent::ConnectFailed) => {
                self.session = Session::default();
                self.apply(LinkEvent::ConnectFailed, now_ms);
            }
            (
                LinkState::Connecting | LinkState::Pairing | LinkState::Ready,
                RadioEvent::Disconnected,
            ) => self.lose_connection(now_ms),
            _ => {}
        }
    }

    fn on_connected(&mut self, now_ms: u32) {
        for channel in Channel::ALL {
            self.session.channels[channel.index()] = self.radio.channel(&channel.uuid());
        }
        if self.session.channels.iter().any(Option::is_none) {
            warn!("display is missing link channels");
            self.radio.disconnect();
            self.lose_connection(now_ms);
            return;
        }
        self.radio.start_pairing();
        self.session.pairing_since_ms = now_ms;
        self.apply(LinkEvent::Connected, now_ms);
    }

    fn lose_connection(&mut self, now_ms: u32) {
        self.session = Session::default();
        self.apply(LinkEvent::ConnectionLost, now_ms);
    }

    fn apply(&mut self, event: LinkEvent, now_ms: u32) {
        let next = self.state.transition(event);
        if next != self.state {
            debug!("display link {} -> {}", self.state, next);
            self.state = next;
            self.since_ms = now_ms;
        }
    }
}
