//! Bar-scale gauge
//!
//! `[-----  | ]`: a bar filled up to the current value with a marker at
//! the reference (historical average). The marker shows as `+` inside the bar.

use heapless::String;
use libm::roundf;

/// Widest scale that fits a display row
pub const MAX_SCALE_WIDTH: usize = 20;

pub type Scale = String<MAX_SCALE_WIDTH>;

/// Interior cell of `v` on a scale with `cells` interior cells
fn cell(v: f32, min: f32, max: f32, cells: usize) -> usize {
    let last = cells.saturating_sub(1) as f32;
    let pos = roundf((v - min) / (max - min) * cells as f32);
    // NaN ends up at zero
    pos.clamp(0.0, last) as usize
}

/// Render `value` within `[min, max]` with a marker at `reference`
///
/// `width` counts the brackets and is clamped to `2..=MAX_SCALE_WIDTH`.
/// A value at or below `min` leaves the bar empty; the marker is still drawn
/// unless the reference is at or below `min` too. An empty range renders
/// nothing.
pub fn generate_scale(value: f32, min: f32, max: f32, reference: f32, width: usize) -> Scale {
    let width = width.clamp(2, MAX_SCALE_WIDTH);
    let cells = width - 2;
    let ranged = max > min;
    let bar = ranged && value > min;
    let marker = ranged && (bar || reference > min);
    let value_pos = cell(value, min, max, cells);
    let ref_pos = cell(reference, min, max, cells);

    let mut out = Scale::new();
    // Capacity is MAX_SCALE_WIDTH and at most `width` chars are pushed
    let _ = out.push('[');
    for i in 0..cells {
        let c = match (bar && i <= value_pos, marker && i == ref_pos) {
            (true, true) => '+',
            (true, false) => '-',
            (false, true) => '|',
            (false, false) => ' ',
        };
        let _ = out.push(c);
    }
    let _ = out.push(']');
    out
}
