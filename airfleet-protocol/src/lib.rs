//! AirFleet wire formats
//!
//! Everything that crosses a wire or a radio link is defined here so the
//! sensor node, the display peripheral and the radio co-processor agree on
//! one encoding:
//!
//! - [`checksum`]: CRC-8 variants for the bus sensors, NMEA XOR for GPS
//! - [`link`]: the four display-link channels and their payloads
//! - [`cloud`]: telemetry payload and historical levels response
//! - [`frame`] / [`bridge`]: UART framing to the radio co-processor
//!
//! ```text
//! ┌───────┬────────┬──────┬─────────────┬──────────┐
//! │ START │ LENGTH │ TYPE │ PAYLOAD     │ CHECKSUM │
//! │ 1B    │ 1B     │ 1B   │ 0–255B      │ 1B       │
//! └───────┴────────┴──────┴─────────────┴──────────┘
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bridge;
pub mod checksum;
pub mod cloud;
pub mod frame;
pub mod link;

pub use bridge::{ChannelSet, CoprocessorEvent, HostCommand};
pub use cloud::{LevelsUpdate, TelemetryPayload};
pub use frame::{Frame, FrameError, FrameParser, FRAME_START, MAX_PAYLOAD_SIZE};
pub use link::{Channel, FlashDescriptor, PeerAddress, Uuid, SERVICE_UUID};
