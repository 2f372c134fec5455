//! Orchestrator state machine
//!
//! Explicit, finite and deterministic: `Init → Sample → Idle →
//! {Publish, Levels, Sleep} → Idle`, with `Sleep → Init` on wake.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::State;
