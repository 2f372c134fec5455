//! Device orchestration
//!
//! The [`Orchestrator`] owns every collaborator and drives them from the
//! node state machine. Screen layout and gauge rendering live alongside it.

pub mod context;
pub mod controller;
pub mod scale;
pub mod screen;
pub mod trigger;

pub use context::{Averages, Context, Snapshot};
pub use controller::{Board, Collaborators, Orchestrator, Tick, WakeCondition};
pub use scale::generate_scale;
pub use screen::Alert;
pub use trigger::SampleTrigger;
