//! Configuration types
//!
//! Board-agnostic configuration. The firmware build script parses
//! `airfleet.toml` into [`Config`], validates it, and embeds it as postcard
//! binary data that is decoded again at boot.

pub mod types;

pub use types::*;
