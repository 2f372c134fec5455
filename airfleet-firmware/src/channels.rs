//! Inter-task communication channels
//!
//! The bridge tasks own the co-processor UART. The controller task reaches
//! it only through these statics: commands go out on [`COMMANDS`], outcomes
//! come back on the event channels and the link state flags.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use portable_atomic::{AtomicBool, AtomicU8};

use airfleet_core::orchestrator::SampleTrigger;
use airfleet_core::traits::{CloudEvent, RadioEvent};
use airfleet_protocol::bridge::HostCommand;

/// Channel capacity for outbound commands
const COMMAND_CHANNEL_SIZE: usize = 16;

/// Channel capacity for radio outcomes
const RADIO_CHANNEL_SIZE: usize = 8;

/// Channel capacity for subscribed cloud events
const CLOUD_CHANNEL_SIZE: usize = 4;

/// Commands for the co-processor, drained by the bridge TX task
pub static COMMANDS: Channel<CriticalSectionRawMutex, HostCommand, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Radio outcomes from the co-processor
pub static RADIO_EVENTS: Channel<CriticalSectionRawMutex, RadioEvent, RADIO_CHANNEL_SIZE> =
    Channel::new();

/// Subscribed cloud events from the co-processor
pub static CLOUD_EVENTS: Channel<CriticalSectionRawMutex, CloudEvent, CLOUD_CHANNEL_SIZE> =
    Channel::new();

/// Set by the sample timer, consumed by the controller
pub static SAMPLE_TRIGGER: SampleTrigger = SampleTrigger::new();

/// Display peer connected
pub static RADIO_CONNECTED: AtomicBool = AtomicBool::new(false);

/// Pairing in progress on the display link
pub static RADIO_PAIRING: AtomicBool = AtomicBool::new(false);

/// Channels discovered on the connected peer, as a `ChannelSet` mask
pub static RADIO_CHANNELS: AtomicU8 = AtomicU8::new(0);

/// Cloud session established
pub static CLOUD_CONNECTED: AtomicBool = AtomicBool::new(false);
