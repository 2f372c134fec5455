//! Co-processor backed collaborators
//!
//! The BLE radio and the cloud session live on the co-processor. These
//! adapters turn collaborator calls into queued [`HostCommand`]s and answer
//! state queries from the flags the bridge RX task keeps current.

use defmt::*;
use embassy_time::{Duration, Instant};
use portable_atomic::Ordering;

use airfleet_core::traits::{
    ChannelHandle, CloudError, CloudEvent, CloudTransport, LinkRadio, RadioError, RadioEvent,
};
use airfleet_protocol::bridge::{bounded, ChannelSet, HostCommand};
use airfleet_protocol::link::{Channel, Payload, PeerAddress, Uuid};

use crate::channels::{
    CLOUD_CONNECTED, CLOUD_EVENTS, COMMANDS, RADIO_CHANNELS, RADIO_CONNECTED, RADIO_EVENTS,
    RADIO_PAIRING,
};

/// Queue a command without waiting; false if the queue is full
fn queue(command: HostCommand) -> bool {
    if COMMANDS.try_send(command).is_err() {
        warn!("Bridge command queue full, dropping command");
        return false;
    }
    true
}

/// Display radio on the co-processor
pub struct BridgeRadio;

impl LinkRadio for BridgeRadio {
    fn power_on(&mut self) {
        queue(HostCommand::RadioOn);
    }

    fn power_off(&mut self) {
        queue(HostCommand::RadioOff);
        RADIO_CONNECTED.store(false, Ordering::Release);
        RADIO_PAIRING.store(false, Ordering::Release);
        RADIO_CHANNELS.store(0, Ordering::Release);
    }

    fn start_scan(&mut self) {
        queue(HostCommand::StartScan);
    }

    fn stop_scan(&mut self) {
        queue(HostCommand::StopScan);
    }

    fn connect(&mut self, address: PeerAddress) {
        queue(HostCommand::Connect(address));
    }

    fn disconnect(&mut self) {
        queue(HostCommand::Disconnect);
        RADIO_CONNECTED.store(false, Ordering::Release);
        RADIO_PAIRING.store(false, Ordering::Release);
        RADIO_CHANNELS.store(0, Ordering::Release);
    }

    fn channel(&self, id: &Uuid) -> Option<ChannelHandle> {
        let channel = Channel::from_uuid(id)?;
        let discovered = ChannelSet(RADIO_CHANNELS.load(Ordering::Acquire));
        discovered
            .contains(channel)
            .then_some(ChannelHandle(channel as u8))
    }

    fn start_pairing(&mut self) {
        if queue(HostCommand::StartPairing) {
            RADIO_PAIRING.store(true, Ordering::Release);
        }
    }

    fn is_pairing(&self) -> bool {
        RADIO_PAIRING.load(Ordering::Acquire)
    }

    fn is_connected(&self) -> bool {
        RADIO_CONNECTED.load(Ordering::Acquire)
    }

    fn write(&mut self, channel: ChannelHandle, data: &[u8]) -> Result<(), RadioError> {
        if !self.is_connected() {
            return Err(RadioError::NotConnected);
        }
        let channel = Channel::from_u8(channel.0).ok_or(RadioError::WriteFailed)?;
        let mut payload = Payload::new();
        payload
            .extend_from_slice(data)
            .map_err(|_| RadioError::PayloadTooLarge)?;
        if queue(HostCommand::Write {
            channel,
            data: payload,
        }) {
            Ok(())
        } else {
            Err(RadioError::WriteFailed)
        }
    }

    fn poll_event(&mut self) -> Option<RadioEvent> {
        RADIO_EVENTS.try_receive().ok()
    }
}

/// A connect request without a status answer is repeated after this long
const CLOUD_CONNECT_RETRY: Duration = Duration::from_secs(5);

/// Cloud session on the co-processor
#[derive(Default)]
pub struct BridgeCloud {
    connect_requested: Option<Instant>,
}

impl CloudTransport for BridgeCloud {
    fn is_connected(&self) -> bool {
        CLOUD_CONNECTED.load(Ordering::Acquire)
    }

    fn connect(&mut self) {
        if self.is_connected() {
            self.connect_requested = None;
            return;
        }
        let pending = self
            .connect_requested
            .is_some_and(|at| at.elapsed() < CLOUD_CONNECT_RETRY);
        if !pending && queue(HostCommand::CloudConnect) {
            self.connect_requested = Some(Instant::now());
        }
    }

    fn disconnect(&mut self) {
        self.connect_requested = None;
        queue(HostCommand::CloudDisconnect);
        CLOUD_CONNECTED.store(false, Ordering::Release);
    }

    fn subscribe(&mut self, event: &str) -> Result<(), CloudError> {
        let event = bounded(event).map_err(|_| CloudError::PayloadTooLarge)?;
        if queue(HostCommand::Subscribe { event }) {
            Ok(())
        } else {
            Err(CloudError::Rejected)
        }
    }

    fn publish(&mut self, event: &str, data: &str) -> Result<(), CloudError> {
        if !self.is_connected() {
            return Err(CloudError::NotConnected);
        }
        let event = bounded(event).map_err(|_| CloudError::PayloadTooLarge)?;
        let data = bounded(data).map_err(|_| CloudError::PayloadTooLarge)?;
        if queue(HostCommand::Publish { event, data }) {
            Ok(())
        } else {
            Err(CloudError::Rejected)
        }
    }

    fn poll_event(&mut self) -> Option<CloudEvent> {
        CLOUD_EVENTS.try_receive().ok()
    }
}
