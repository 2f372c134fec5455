//! Cloud publish/subscribe transport
//!
//! Best-effort: `connect` only requests a connection and `publish` only
//! hands the event to the transport. Subscribed events are queued and
//! drained by the orchestrator at the top of each tick.

use airfleet_protocol::cloud::{EventData, EventName};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CloudError {
    NotConnected,
    /// Transport refused the request (queue full, rate limited)
    Rejected,
    PayloadTooLarge,
}

/// An inbound subscribed event
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CloudEvent {
    pub name: EventName,
    pub data: EventData,
}

pub trait CloudTransport {
    fn is_connected(&self) -> bool;

    /// Request a connection; idempotent and non-blocking
    fn connect(&mut self);

    fn disconnect(&mut self);

    fn subscribe(&mut self, event: &str) -> Result<(), CloudError>;

    fn publish(&mut self, event: &str, data: &str) -> Result<(), CloudError>;

    fn poll_event(&mut self) -> Option<CloudEvent>;
}
