//! Wireless display link
//!
//! [`DisplayLink`] owns the radio session and the [`DisplayCache`]; the
//! orchestrator only ever talks to the display through it.

pub mod cache;
pub mod link;
pub mod state;

pub use cache::DisplayCache;
pub use link::{DisplayLink, LinkError, Update, DEFAULT_BACKOFF_MS};
pub use state::{LinkEvent, LinkState};
