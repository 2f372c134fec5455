//! Peripheral side of the display link
//!
//! Each channel write is decoded and applied to the [`Screen`]. The flash
//! overlay alternates its region between the flash text and blanks; it is
//! drawn over the grid only when a row is rendered, so the grid underneath
//! stays untouched.

use airfleet_protocol::link::{Channel, FlashDescriptor, LinkCommand, LinkDecodeError};

use crate::screen::{Screen, SCREEN_COLS};

/// Status line shown before the first connection
pub const STATUS_WAITING: &[u8] = b"Waiting for link    ";
pub const STATUS_CONNECTED: &[u8] = b"Connected           ";
pub const STATUS_DISCONNECTED: &[u8] = b"Disconnected        ";

/// Row used for link status messages
const STATUS_ROW: u8 = 3;

#[derive(Debug, Clone, Default)]
pub struct Terminal {
    screen: Screen,
    flash: FlashDescriptor,
    /// Whether the flash text (rather than blanks) is showing
    flash_shown: bool,
    last_toggle_ms: u32,
}

impl Terminal {
    /// Fresh terminal showing the waiting status
    pub fn new() -> Self {
        let mut terminal = Self::default();
        terminal.screen.write_at(0, STATUS_ROW, STATUS_WAITING);
        terminal
    }

    /// Apply one write received on `channel`
    pub fn apply(&mut self, channel: Channel, payload: &[u8]) -> Result<(), LinkDecodeError> {
        match LinkCommand::decode(channel, payload)? {
            LinkCommand::Clear => self.screen.clear(),
            LinkCommand::SetCursor { x, y } => {
                self.screen.set_cursor(x, y);
            }
            LinkCommand::Print { x, y, text } => {
                if self.screen.set_cursor(x, y) {
                    self.screen.write(text);
                }
            }
            LinkCommand::Flash(flash) => {
                self.flash = if flash.is_enabled() {
                    flash
                } else {
                    FlashDescriptor::disabled()
                };
                self.flash_shown = true;
                self.screen.mark_dirty();
            }
        }
        Ok(())
    }

    /// Advance the flash phase; returns true when the visible content changed
    pub fn service(&mut self, now_ms: u32) -> bool {
        if !self.flash.is_enabled() {
            return false;
        }
        if now_ms.wrapping_sub(self.last_toggle_ms) < u32::from(self.flash.interval_ms) {
            return false;
        }
        self.last_toggle_ms = now_ms;
        self.flash_shown = !self.flash_shown;
        self.screen.mark_dirty();
        true
    }

    /// Peer connected
    pub fn connected(&mut self) {
        self.screen.write_at(0, STATUS_ROW, STATUS_CONNECTED);
    }

    /// Peer went away
    pub fn disconnected(&mut self) {
        self.screen.write_at(0, STATUS_ROW, STATUS_DISCONNECTED);
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    pub fn flash(&self) -> &FlashDescriptor {
        &self.flash
    }

    /// Row `y` as it should appear on the glass, flash overlay included
    pub fn visible_row(&self, y: usize) -> Option<[u8; SCREEN_COLS]> {
        let mut row = *self.screen.row(y)?;
        if self.flash.is_enabled() && self.flash.y as usize == y {
            let start = self.flash.x as usize;
            if start < SCREEN_COLS {
                let len = self.flash.text.len().min(SCREEN_COLS - start);
                let region = &mut row[start..start + len];
                if self.flash_shown {
                    region.copy_from_slice(&self.flash.text[..len]);
                } else {
                    region.fill(b' ');
                }
            }
        }
        Some(row)
    }
}
