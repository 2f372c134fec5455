//! Events that trigger orchestrator transitions

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Lifecycle events
    /// Collaborators powered on
    InitComplete,
    /// Woke from sleep
    Woke,

    // Sampling events
    /// Sample timer fired
    SampleRequested,
    /// All sensors read and the display refreshed
    SampleComplete,

    // Guard events
    /// Ignition / external power signal absent
    IgnitionOff,
    /// Publish interval elapsed or distance threshold crossed
    PublishDue,

    // Cloud events
    /// Transport not connected; connect requested, retry later
    Deferred,
    /// Telemetry handed to the transport
    Published,
    /// Telemetry published and the averages are due for a refresh
    LevelsDue,
    /// Averages requested from the backend
    LevelsRequested,
}
