//! Believed contents of the remote display
//!
//! The cache always reflects the last accepted intent, connected or not, so
//! that a fresh session can replay it and converge the remote.

use airfleet_protocol::link::{FlashDescriptor, DISPLAY_COLS, DISPLAY_ROWS};

const BLANK: u8 = b' ';

/// Cache errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfBounds;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCache {
    grid: [[u8; DISPLAY_COLS]; DISPLAY_ROWS],
    flash: FlashDescriptor,
    /// Set by a clear, dropped by the first print afterwards
    blank: bool,
}

impl Default for DisplayCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayCache {
    pub fn new() -> Self {
        Self {
            grid: [[BLANK; DISPLAY_COLS]; DISPLAY_ROWS],
            flash: FlashDescriptor::disabled(),
            blank: true,
        }
    }

    /// Forget everything, grid and flash
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// True after a clear until something is printed
    pub fn is_blank(&self) -> bool {
        self.blank
    }

    /// Blank the grid; returns false when it already was
    pub fn clear(&mut self) -> bool {
        if self.blank {
            return false;
        }
        self.grid = [[BLANK; DISPLAY_COLS]; DISPLAY_ROWS];
        self.blank = true;
        true
    }

    /// Write `text` at `(x, y)`, clipped at the end of the row
    ///
    /// Returns the number of cells whose content changed.
    pub fn write(&mut self, x: u8, y: u8, text: &[u8]) -> Result<usize, OutOfBounds> {
        let (x, y) = (x as usize, y as usize);
        if x >= DISPLAY_COLS || y >= DISPLAY_ROWS {
            return Err(OutOfBounds);
        }
        let len = text.len().min(DISPLAY_COLS - x);
        let mut changed = 0;
        for (cell, &byte) in self.grid[y][x..x + len].iter_mut().zip(text) {
            if *cell != byte {
                *cell = byte;
                changed += 1;
            }
        }
        if len > 0 {
            self.blank = false;
        }
        Ok(changed)
    }

    pub fn row(&self, y: usize) -> Option<&[u8; DISPLAY_COLS]> {
        self.grid.get(y)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8; DISPLAY_COLS]> {
        self.grid.iter()
    }

    pub fn flash(&self) -> &FlashDescriptor {
        &self.flash
    }

    /// Replace the flash descriptor; returns false when it is byte-identical
    pub fn set_flash(&mut self, flash: FlashDescriptor) -> bool {
        if self.flash.encode() == flash.encode() {
            return false;
        }
        self.flash = flash;
        true
    }
}
