//! Board-agnostic core logic for the AirFleet sensor node
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Collaborator traits (bus sensors, GPS, display radio, cloud, board)
//! - NMEA positioning stream processor
//! - Display link session and content cache
//! - Node state machine and the orchestrator that drives it
//! - Configuration type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

mod fmt;

pub mod config;
pub mod display;
pub mod orchestrator;
pub mod positioning;
pub mod state;
pub mod traits;
