//! Periodic sample trigger
//!
//! Fires the sample trigger on the configured interval. The controller
//! consumes it at the top of its next tick, so a slow tick only ever
//! coalesces triggers.

use defmt::*;
use embassy_time::{Duration, Ticker};

use crate::channels::SAMPLE_TRIGGER;

/// Sample timer task
#[embassy_executor::task]
pub async fn sample_timer_task(interval_ms: u32) {
    info!("Sample timer started, every {} ms", interval_ms);

    let mut ticker = Ticker::every(Duration::from_millis(interval_ms as u64));

    loop {
        ticker.next().await;
        SAMPLE_TRIGGER.fire();
    }
}
