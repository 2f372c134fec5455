//! Orchestrator context
//!
//! Everything the orchestrator remembers between ticks, owned by the
//! orchestrator and handed around explicitly.

use airfleet_protocol::cloud::{LevelsUpdate, TelemetryPayload};

use super::screen::{Alert, Line};
use crate::config::{LevelsConfig, PublishConfig};
use crate::positioning::PositionFix;
use crate::traits::{ClimateReading, GasReading, ParticulateReading};

/// Last good value of every sensor kind
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Snapshot {
    pub particulate: Option<ParticulateReading>,
    pub climate: Option<ClimateReading>,
    pub gas: Option<GasReading>,
    /// Last fix flagged valid
    pub fix: Option<PositionFix>,
}

impl Snapshot {
    /// Telemetry record; kinds never read report zero
    pub fn payload<'a>(&self, time: &'a str) -> TelemetryPayload<'a> {
        let particulate = self.particulate.unwrap_or_default();
        let climate = self.climate.unwrap_or_default();
        let gas = self.gas.unwrap_or_default();
        let fix = self.fix.unwrap_or_default();
        TelemetryPayload {
            particulate: particulate.as_array(),
            temperature: climate.temperature,
            humidity: climate.humidity,
            voc: gas.voc,
            co2: gas.co2,
            latitude: fix.latitude,
            longitude: fix.longitude,
            time,
        }
    }
}

/// Backend supplied historical averages, used as gauge reference marks
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Averages {
    pub co2: f32,
    /// pm1, pm2.5, pm4, pm10
    pub particulate: [f32; 4],
}

impl Averages {
    /// Overwrite the slots present in `update`
    pub fn apply(&mut self, update: &LevelsUpdate) {
        let [pm1, pm25, pm4, pm10] = &mut self.particulate;
        let slots = [
            (&mut self.co2, update.co2),
            (pm1, update.pm1),
            (pm25, update.pm25),
            (pm4, update.pm4),
            (pm10, update.pm10),
        ];
        for (slot, value) in slots {
            if let Some(value) = value.filter(|v| v.is_finite()) {
                *slot = value;
            }
        }
    }

    /// Reference for the particulate gauge, which shows the largest fraction
    pub fn particulate_reference(&self) -> f32 {
        self.particulate.iter().copied().fold(0.0, f32::max)
    }
}

/// What is currently rendered, so unchanged values are not re-sent
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shown {
    pub particulate: Option<(ParticulateReading, f32)>,
    pub gas: Option<(GasReading, f32)>,
    pub climate: Option<ClimateReading>,
    pub clock: Option<Line>,
    pub alert: Option<Alert>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Context {
    pub snapshot: Snapshot,
    pub averages: Averages,
    pub shown: Shown,
    pub last_publish_ms: u32,
    /// When averages were last requested
    pub last_levels_ms: Option<u32>,
    /// Outstanding levels request
    pub levels_pending_since: Option<u32>,
    /// Distance threshold crossed since the last publish
    pub distance_due: bool,
    /// Subscribed to the levels response
    pub subscribed: bool,
}

impl Context {
    pub fn publish_due(&self, now_ms: u32, config: &PublishConfig) -> bool {
        self.distance_due || now_ms.wrapping_sub(self.last_publish_ms) >= config.interval_ms
    }

    pub fn levels_due(&self, now_ms: u32, config: &LevelsConfig) -> bool {
        match self.last_levels_ms {
            None => true,
            Some(at) => now_ms.wrapping_sub(at) >= config.refresh_interval_ms,
        }
    }

    pub fn levels_timed_out(&self, now_ms: u32, config: &LevelsConfig) -> bool {
        self.levels_pending_since
            .is_some_and(|at| now_ms.wrapping_sub(at) >= config.response_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_defaults_to_zero() {
        let payload = Snapshot::default().payload("0000-00-00 00:00:00");
        assert_eq!(payload.particulate, [0.0; 4]);
        assert_eq!(payload.co2, 0);
        assert_eq!(payload.latitude, 0.0);
    }

    #[test]
    fn test_averages_partial_update() {
        let mut averages = Averages {
            co2: 700.0,
            particulate: [1.0, 2.0, 3.0, 4.0],
        };
        averages.apply(&LevelsUpdate {
            co2: Some(812.5),
            pm25: Some(9.0),
            ..LevelsUpdate::default()
        });
        assert_eq!(averages.co2, 812.5);
        assert_eq!(averages.particulate, [1.0, 9.0, 3.0, 4.0]);
        assert_eq!(averages.particulate_reference(), 9.0);
    }

    #[test]
    fn test_publish_due() {
        let config = PublishConfig::default();
        let mut ctx = Context {
            last_publish_ms: 1_000,
            ..Context::default()
        };
        assert!(!ctx.publish_due(60_999, &config));
        assert!(ctx.publish_due(61_000, &config));
        ctx.distance_due = true;
        assert!(ctx.publish_due(1_001, &config));
    }

    #[test]
    fn test_levels_due_and_timeout() {
        let config = LevelsConfig::default();
        let mut ctx = Context::default();
        assert!(ctx.levels_due(0, &config));
        ctx.last_levels_ms = Some(10);
        assert!(!ctx.levels_due(3_600_009, &config));
        assert!(ctx.levels_due(3_600_010, &config));

        assert!(!ctx.levels_timed_out(100, &config));
        ctx.levels_pending_since = Some(100);
        assert!(!ctx.levels_timed_out(30_099, &config));
        assert!(ctx.levels_timed_out(30_100, &config));
    }
}
