//! Character grid
//!
//! Cells hold raw bytes as sent over the link; the LCD character ROM decides
//! what they look like.

use airfleet_protocol::link::{DISPLAY_COLS, DISPLAY_ROWS};

pub const SCREEN_ROWS: usize = DISPLAY_ROWS;
pub const SCREEN_COLS: usize = DISPLAY_COLS;

const BLANK: u8 = b' ';

/// 20x4 grid with an LCD-style cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    cells: [[u8; SCREEN_COLS]; SCREEN_ROWS],
    cursor: (u8, u8),
    /// Whether the screen needs to be redrawn
    dirty: bool,
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen {
    pub fn new() -> Self {
        Self {
            cells: [[BLANK; SCREEN_COLS]; SCREEN_ROWS],
            cursor: (0, 0),
            dirty: true,
        }
    }

    /// Blank every cell and home the cursor
    pub fn clear(&mut self) {
        self.cells = [[BLANK; SCREEN_COLS]; SCREEN_ROWS];
        self.cursor = (0, 0);
        self.dirty = true;
    }

    /// Move the cursor; positions off the grid are ignored
    pub fn set_cursor(&mut self, x: u8, y: u8) -> bool {
        if (x as usize) < SCREEN_COLS && (y as usize) < SCREEN_ROWS {
            self.cursor = (x, y);
            true
        } else {
            false
        }
    }

    pub fn cursor(&self) -> (u8, u8) {
        self.cursor
    }

    /// Write at the cursor, clipping at the end of the row
    ///
    /// The cursor ends up after the last written cell.
    pub fn write(&mut self, text: &[u8]) {
        let (x, y) = self.cursor;
        let written = self.write_at(x, y, text);
        self.cursor = (x + written as u8, y);
        if self.cursor.0 as usize >= SCREEN_COLS {
            self.cursor.0 = SCREEN_COLS as u8 - 1;
        }
    }

    /// Write at `(x, y)` without moving the cursor; returns cells written
    pub fn write_at(&mut self, x: u8, y: u8, text: &[u8]) -> usize {
        let Some(row) = self.cells.get_mut(y as usize) else {
            return 0;
        };
        let start = x as usize;
        if start >= SCREEN_COLS {
            return 0;
        }
        let len = text.len().min(SCREEN_COLS - start);
        row[start..start + len].copy_from_slice(&text[..len]);
        if len > 0 {
            self.dirty = true;
        }
        len
    }

    pub fn row(&self, y: usize) -> Option<&[u8; SCREEN_COLS]> {
        self.cells.get(y)
    }

    /// Row as text, `None` for rows off the grid or non-UTF-8 content
    pub fn line(&self, y: usize) -> Option<&str> {
        self.row(y).and_then(|row| core::str::from_utf8(row).ok())
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().flatten().all(|&c| c == BLANK)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark screen as clean (after rendering)
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_screen_blank() {
        let screen = Screen::new();
        assert!(screen.is_blank());
        assert_eq!(screen.line(0), Some("                    "));
        assert_eq!(screen.line(4), None);
    }

    #[test]
    fn test_write_at_clips_row() {
        let mut screen = Screen::new();
        assert_eq!(screen.write_at(17, 1, b"ABCDEF"), 3);
        assert_eq!(screen.line(1), Some("                 ABC"));
        assert_eq!(screen.line(2), Some("                    "));
    }

    #[test]
    fn test_write_off_grid_ignored() {
        let mut screen = Screen::new();
        assert_eq!(screen.write_at(20, 0, b"X"), 0);
        assert_eq!(screen.write_at(0, 4, b"X"), 0);
        assert!(screen.is_blank());
    }

    #[test]
    fn test_cursor_write_advances() {
        let mut screen = Screen::new();
        assert!(screen.set_cursor(2, 3));
        screen.write(b"AB");
        screen.write(b"CD");
        assert_eq!(screen.line(3), Some("  ABCD              "));
        assert!(!screen.set_cursor(0, 9));
        assert_eq!(screen.cursor(), (6, 3));
    }

    #[test]
    fn test_clear_homes_cursor() {
        let mut screen = Screen::new();
        screen.set_cursor(5, 2);
        screen.write(b"X");
        screen.clear();
        assert!(screen.is_blank());
        assert_eq!(screen.cursor(), (0, 0));
    }

    #[test]
    fn test_dirty_tracking() {
        let mut screen = Screen::new();
        screen.mark_clean();
        screen.write_at(0, 0, b"");
        assert!(!screen.is_dirty());
        screen.write_at(0, 0, b"A");
        assert!(screen.is_dirty());
    }
}
