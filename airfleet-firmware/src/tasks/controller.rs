//! Controller task
//!
//! Owns the orchestrator and runs it tick by tick. A tick never blocks, so
//! the only waits are the pause between ticks and the sleep while the
//! ignition is off.

use defmt::*;
use embassy_time::{Instant, Timer};

use airfleet_core::orchestrator::Tick;

use crate::board::NodeOrchestrator;
use crate::channels::SAMPLE_TRIGGER;

/// Pause between ticks while awake
const TICK_INTERVAL_MS: u64 = 10;

fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}

/// Controller task - drives the state machine
#[embassy_executor::task]
pub async fn controller_task(orchestrator: &'static mut NodeOrchestrator) {
    info!("Controller task started");

    let mut state = orchestrator.state();

    loop {
        if SAMPLE_TRIGGER.take() {
            orchestrator.trigger_sample();
        }

        let outcome = orchestrator.tick(now_ms());

        if orchestrator.state() != state {
            state = orchestrator.state();
            debug!("State: {:?}", state);
        }

        match outcome {
            Tick::Continue => Timer::after_millis(TICK_INTERVAL_MS).await,
            Tick::Sleep(condition) => {
                info!("Sleeping until {:?}", condition);
                orchestrator
                    .collaborators_mut()
                    .platform
                    .wait_for_wake(condition)
                    .await;
                orchestrator.wake();
                state = orchestrator.state();
                info!("Awake");
            }
        }
    }
}
