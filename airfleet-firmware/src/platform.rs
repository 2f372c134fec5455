//! Board signals: ignition sense, supply voltage and the sleep primitive

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::adc::{Adc, Blocking, Channel};
use embassy_rp::gpio::Input;
use embassy_time::Timer;

use airfleet_core::orchestrator::WakeCondition;
use airfleet_core::traits::Platform;

/// ADC reference voltage
const ADC_VREF: f32 = 3.3;

/// 12-bit ADC full scale
const ADC_MAX: f32 = 4096.0;

/// Supply voltage divider on the battery sense pin (100k over 33k)
const BATTERY_DIVIDER: f32 = 133.0 / 33.0;

pub struct NodePlatform {
    ignition: Input<'static>,
    adc: Adc<'static, Blocking>,
    battery: Channel<'static>,
}

impl NodePlatform {
    pub fn new(ignition: Input<'static>, adc: Adc<'static, Blocking>, battery: Channel<'static>) -> Self {
        Self {
            ignition,
            adc,
            battery,
        }
    }

    /// Wait until `condition` is met
    pub async fn wait_for_wake(&mut self, condition: WakeCondition) {
        match condition.check_interval_ms {
            Some(interval_ms) if condition.ignition_rising => {
                match select(
                    self.ignition.wait_for_high(),
                    Timer::after_millis(interval_ms as u64),
                )
                .await
                {
                    Either::First(_) => info!("Woken by ignition"),
                    Either::Second(_) => debug!("Woken by check interval"),
                }
            }
            Some(interval_ms) => Timer::after_millis(interval_ms as u64).await,
            None => {
                // Without an ignition wake there would be nothing left to wake on
                self.ignition.wait_for_high().await;
                info!("Woken by ignition");
            }
        }
    }
}

impl Platform for NodePlatform {
    fn ignition_on(&mut self) -> bool {
        self.ignition.is_high()
    }

    fn battery_voltage(&mut self) -> Option<f32> {
        match self.adc.blocking_read(&mut self.battery) {
            Ok(raw) => Some(raw as f32 * ADC_VREF / ADC_MAX * BATTERY_DIVIDER),
            Err(e) => {
                warn!("Battery ADC read failed: {:?}", e);
                None
            }
        }
    }
}
