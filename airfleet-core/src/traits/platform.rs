//! Board level signals

pub trait Platform {
    /// Vehicle ignition / external power present
    fn ignition_on(&mut self) -> bool;

    /// Supply voltage, for diagnostics only
    fn battery_voltage(&mut self) -> Option<f32> {
        None
    }
}
