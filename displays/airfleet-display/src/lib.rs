//! Remote display terminal for AirFleet
//!
//! The display peripheral advertises the link service and exposes four
//! write-only channels (clear, set-cursor, print, flash). [`Terminal`]
//! applies those writes to a 20x4 character [`Screen`] and runs the flash
//! overlay. A display firmware renders [`Terminal::visible_row`] to its
//! LCD; the sensor node tests use the same terminal as the simulated remote.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod screen;
pub mod terminal;

pub use screen::{Screen, SCREEN_COLS, SCREEN_ROWS};
pub use terminal::{Terminal, STATUS_CONNECTED, STATUS_DISCONNECTED, STATUS_WAITING};
