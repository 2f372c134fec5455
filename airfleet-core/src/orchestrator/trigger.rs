//! Sample trigger flag
//!
//! Set from timer or interrupt context, consumed by the tick. Both sides
//! touch a single atomic word and nothing else.

use portable_atomic::{AtomicBool, Ordering};

pub struct SampleTrigger {
    fired: AtomicBool,
}

impl Default for SampleTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleTrigger {
    pub const fn new() -> Self {
        Self {
            fired: AtomicBool::new(false),
        }
    }

    pub fn fire(&self) {
        self.fired.store(true, Ordering::Release);
    }

    /// Consume a pending trigger
    pub fn take(&self) -> bool {
        self.fired.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_consumes() {
        let trigger = SampleTrigger::new();
        assert!(!trigger.take());
        trigger.fire();
        trigger.fire();
        assert!(trigger.take());
        assert!(!trigger.take());
    }

    #[test]
    fn test_fire_from_other_thread() {
        static TRIGGER: SampleTrigger = SampleTrigger::new();
        std::thread::spawn(|| TRIGGER.fire()).join().unwrap();
        assert!(TRIGGER.take());
    }
}
