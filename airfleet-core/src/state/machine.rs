//! Orchestrator state machine definition
//!
//! What the node does on a tick is a function of the current state only;
//! guards are evaluated by the controller and fed in as events.

use super::events::Event;

/// Node states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Power on every collaborator
    Init,
    /// Read every sensor and the position fix, refresh the display
    Sample,
    /// Service collaborators, evaluate guards
    Idle,
    /// Send telemetry
    Publish,
    /// Request historical averages
    Levels,
    /// Everything off, waiting for ignition
    Sleep,
}

impl State {
    /// Process an event and return the next state
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use State::*;

        match (self, event) {
            // Sleep is left only by waking up
            (Sleep, Woke) => Init,
            (Sleep, _) => Sleep,

            // Init always runs; its own sample follows
            (Init, SampleRequested) => Init,

            // Timer driven sampling preempts everything else
            (_, SampleRequested) => Sample,

            (Init, InitComplete) => Sample,

            (Sample, SampleComplete) => Idle,

            // Idle guards, ignition first
            (Idle, IgnitionOff) => Sleep,
            (Idle, PublishDue) => Publish,

            // Publish transitions
            (Publish, Deferred) => Idle,
            (Publish, Published) => Idle,
            (Publish, LevelsDue) => Levels,

            // Levels transitions
            (Levels, Deferred) => Idle,
            (Levels, LevelsRequested) => Idle,

            // Default: stay in current state
            _ => self,
        }
    }
}
