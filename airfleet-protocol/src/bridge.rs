//! Radio co-processor bridge messages
//!
//! The controller has no radio of its own. A co-processor on a UART owns the
//! short-range link to the display and the cloud connection; these messages
//! travel over it inside [`Frame`]s.
//!
//! Host → co-processor types live in 0x10..0x2F, co-processor → host types
//! in 0x80..0x9F.

use heapless::{String, Vec};

use crate::cloud::{EventData, EventName};
use crate::frame::{Frame, FrameError, MAX_PAYLOAD_SIZE};
use crate::link::{Channel, Payload, PeerAddress, Uuid};

pub const MSG_RADIO_ON: u8 = 0x10;
pub const MSG_RADIO_OFF: u8 = 0x11;
pub const MSG_START_SCAN: u8 = 0x12;
pub const MSG_STOP_SCAN: u8 = 0x13;
pub const MSG_CONNECT: u8 = 0x14;
pub const MSG_DISCONNECT: u8 = 0x15;
pub const MSG_START_PAIRING: u8 = 0x16;
pub const MSG_WRITE: u8 = 0x17;
pub const MSG_CLOUD_CONNECT: u8 = 0x20;
pub const MSG_CLOUD_DISCONNECT: u8 = 0x21;
pub const MSG_SUBSCRIBE: u8 = 0x22;
pub const MSG_PUBLISH: u8 = 0x23;

pub const MSG_ADVERTISEMENT: u8 = 0x80;
pub const MSG_SCAN_STOPPED: u8 = 0x81;
pub const MSG_CONNECTED: u8 = 0x82;
pub const MSG_CONNECT_FAILED: u8 = 0x83;
pub const MSG_DISCONNECTED: u8 = 0x84;
pub const MSG_PAIRING_STATUS: u8 = 0x85;
pub const MSG_CLOUD_STATUS: u8 = 0x90;
pub const MSG_CLOUD_EVENT: u8 = 0x91;

/// Set of display channels the co-processor resolved on connect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelSet(pub u8);

impl ChannelSet {
    pub const ALL: ChannelSet = ChannelSet(0b1111);

    pub fn contains(self, channel: Channel) -> bool {
        self.0 & (1 << channel.index()) != 0
    }

    pub fn insert(&mut self, channel: Channel) {
        self.0 |= 1 << channel.index();
    }
}

/// Commands from the controller to the co-processor
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostCommand {
    RadioOn,
    RadioOff,
    StartScan,
    StopScan,
    Connect(PeerAddress),
    Disconnect,
    StartPairing,
    Write { channel: Channel, data: Payload },
    CloudConnect,
    CloudDisconnect,
    Subscribe { event: EventName },
    Publish { event: EventName, data: EventData },
}

/// Events from the co-processor to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CoprocessorEvent {
    Advertisement { address: PeerAddress, service: Uuid },
    ScanStopped,
    Connected { channels: ChannelSet },
    ConnectFailed,
    Disconnected,
    PairingStatus { pairing: bool, paired: bool },
    CloudStatus { connected: bool },
    CloudEvent { name: EventName, data: EventData },
}

/// Copy `s` into a bounded string, failing instead of truncating
pub fn bounded<const N: usize>(s: &str) -> Result<String<N>, FrameError> {
    let mut out = String::new();
    out.push_str(s).map_err(|_| FrameError::PayloadTooLarge)?;
    Ok(out)
}

impl HostCommand {
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            HostCommand::RadioOn => Ok(Frame::empty(MSG_RADIO_ON)),
            HostCommand::RadioOff => Ok(Frame::empty(MSG_RADIO_OFF)),
            HostCommand::StartScan => Ok(Frame::empty(MSG_START_SCAN)),
            HostCommand::StopScan => Ok(Frame::empty(MSG_STOP_SCAN)),
            HostCommand::Connect(address) => Frame::new(MSG_CONNECT, &address.0),
            HostCommand::Disconnect => Ok(Frame::empty(MSG_DISCONNECT)),
            HostCommand::StartPairing => Ok(Frame::empty(MSG_START_PAIRING)),
            HostCommand::Write { channel, data } => {
                let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
                payload
                    .push(*channel as u8)
                    .map_err(|_| FrameError::PayloadTooLarge)?;
                payload
                    .extend_from_slice(data)
                    .map_err(|_| FrameError::PayloadTooLarge)?;
                Frame::new(MSG_WRITE, &payload)
            }
            HostCommand::CloudConnect => Ok(Frame::empty(MSG_CLOUD_CONNECT)),
            HostCommand::CloudDisconnect => Ok(Frame::empty(MSG_CLOUD_DISCONNECT)),
            HostCommand::Subscribe { event } => Frame::new(MSG_SUBSCRIBE, event.as_bytes()),
            HostCommand::Publish { event, data } => {
                named_frame(MSG_PUBLISH, event.as_bytes(), data.as_bytes())
            }
        }
    }

    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        let payload = frame.payload.as_slice();
        match frame.msg_type {
            MSG_RADIO_ON => Ok(HostCommand::RadioOn),
            MSG_RADIO_OFF => Ok(HostCommand::RadioOff),
            MSG_START_SCAN => Ok(HostCommand::StartScan),
            MSG_STOP_SCAN => Ok(HostCommand::StopScan),
            MSG_CONNECT => address(payload).map(HostCommand::Connect),
            MSG_DISCONNECT => Ok(HostCommand::Disconnect),
            MSG_START_PAIRING => Ok(HostCommand::StartPairing),
            MSG_WRITE => {
                let (&channel, data) = payload.split_first().ok_or(FrameError::InvalidPayload)?;
                let channel = Channel::from_u8(channel).ok_or(FrameError::InvalidPayload)?;
                let data = Vec::from_slice(data).map_err(|_| FrameError::PayloadTooLarge)?;
                Ok(HostCommand::Write { channel, data })
            }
            MSG_CLOUD_CONNECT => Ok(HostCommand::CloudConnect),
            MSG_CLOUD_DISCONNECT => Ok(HostCommand::CloudDisconnect),
            MSG_SUBSCRIBE => Ok(HostCommand::Subscribe {
                event: text(payload)?,
            }),
            MSG_PUBLISH => {
                let (event, data) = split_named(payload)?;
                Ok(HostCommand::Publish { event, data })
            }
            other => Err(FrameError::UnknownType(other)),
        }
    }
}

impl CoprocessorEvent {
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            CoprocessorEvent::Advertisement { address, service } => {
                let mut payload = [0u8; 22];
                payload[..6].copy_from_slice(&address.0);
                payload[6..].copy_from_slice(service.as_bytes());
                Frame::new(MSG_ADVERTISEMENT, &payload)
            }
            CoprocessorEvent::ScanStopped => Ok(Frame::empty(MSG_SCAN_STOPPED)),
            CoprocessorEvent::Connected { channels } => Frame::new(MSG_CONNECTED, &[channels.0]),
            CoprocessorEvent::ConnectFailed => Ok(Frame::empty(MSG_CONNECT_FAILED)),
            CoprocessorEvent::Disconnected => Ok(Frame::empty(MSG_DISCONNECTED)),
            CoprocessorEvent::PairingStatus { pairing, paired } => {
                Frame::new(MSG_PAIRING_STATUS, &[*pairing as u8, *paired as u8])
            }
            CoprocessorEvent::CloudStatus { connected } => {
                Frame::new(MSG_CLOUD_STATUS, &[*connected as u8])
            }
            CoprocessorEvent::CloudEvent { name, data } => {
                named_frame(MSG_CLOUD_EVENT, name.as_bytes(), data.as_bytes())
            }
        }
    }

    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        let payload = frame.payload.as_slice();
        match frame.msg_type {
            MSG_ADVERTISEMENT => {
                if payload.len() != 22 {
                    return Err(FrameError::InvalidPayload);
                }
                let mut service = [0u8; 16];
                service.copy_from_slice(&payload[6..]);
                Ok(CoprocessorEvent::Advertisement {
                    address: address(&payload[..6])?,
                    service: Uuid(service),
                })
            }
            MSG_SCAN_STOPPED => Ok(CoprocessorEvent::ScanStopped),
            MSG_CONNECTED => match payload {
                [mask] => Ok(CoprocessorEvent::Connected {
                    channels: ChannelSet(*mask),
                }),
                _ => Err(FrameError::InvalidPayload),
            },
            MSG_CONNECT_FAILED => Ok(CoprocessorEvent::ConnectFailed),
            MSG_DISCONNECTED => Ok(CoprocessorEvent::Disconnected),
            MSG_PAIRING_STATUS => match payload {
                [pairing, paired] => Ok(CoprocessorEvent::PairingStatus {
                    pairing: *pairing != 0,
                    paired: *paired != 0,
                }),
                _ => Err(FrameError::InvalidPayload),
            },
            MSG_CLOUD_STATUS => match payload {
                [connected] => Ok(CoprocessorEvent::CloudStatus {
                    connected: *connected != 0,
                }),
                _ => Err(FrameError::InvalidPayload),
            },
            MSG_CLOUD_EVENT => {
                let (name, data) = split_named(payload)?;
                Ok(CoprocessorEvent::CloudEvent { name, data })
            }
            other => Err(FrameError::UnknownType(other)),
        }
    }
}

fn address(bytes: &[u8]) -> Result<PeerAddress, FrameError> {
    let bytes: [u8; 6] = bytes.try_into().map_err(|_| FrameError::InvalidPayload)?;
    Ok(PeerAddress(bytes))
}

fn text<const N: usize>(bytes: &[u8]) -> Result<String<N>, FrameError> {
    let s = core::str::from_utf8(bytes).map_err(|_| FrameError::InvalidPayload)?;
    bounded(s)
}

/// `[name_len][name][data]`
fn named_frame(msg_type: u8, name: &[u8], data: &[u8]) -> Result<Frame, FrameError> {
    let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
    payload
        .push(name.len() as u8)
        .map_err(|_| FrameError::PayloadTooLarge)?;
    payload
        .extend_from_slice(name)
        .map_err(|_| FrameError::PayloadTooLarge)?;
    payload
        .extend_from_slice(data)
        .map_err(|_| FrameError::PayloadTooLarge)?;
    Frame::new(msg_type, &payload)
}

fn split_named(payload: &[u8]) -> Result<(EventName, EventData), FrameError> {
    let (&len, rest) = payload.split_first().ok_or(FrameError::InvalidPayload)?;
    let len = len as usize;
    if rest.len() < len {
        return Err(FrameError::InvalidPayload);
    }
    let (name, data) = rest.split_at(len);
    Ok((text(name)?, text(data)?))
}
