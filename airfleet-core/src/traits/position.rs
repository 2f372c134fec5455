//! Position source capability

use crate::positioning::PositionFix;

/// A GPS receiver feeding a positioning stream processor
pub trait PositionSource {
    fn on(&mut self);

    fn off(&mut self);

    /// Drain any received bytes into the processor
    fn service(&mut self, now_ms: u32);

    /// Latest fix; never blocks
    fn fix(&self) -> PositionFix;

    /// Zero the accumulated distance
    fn reset_distance(&mut self);
}
