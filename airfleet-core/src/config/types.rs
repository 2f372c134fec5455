//! Configuration type definitions
//!
//! Defaults match the deployed sensor nodes: sample every 2 s, publish every
//! minute or every 500 m, whichever comes first.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::positioning::DistanceStrategy;
use airfleet_protocol::link::DISPLAY_COLS;

/// Columns taken by a gauge row besides the scale itself ("PM " + " " + value)
pub const GAUGE_ROW_OVERHEAD: usize = 8;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// An interval that must be positive is zero
    ZeroInterval(&'static str),
    /// Publish distance must be a positive number of kilometres
    InvalidPublishDistance,
    /// Gauge range is empty or inverted
    InvalidGaugeRange(&'static str),
    /// Gauge width outside 3..=12
    InvalidGaugeWidth,
    /// Embedded binary config could not be decoded
    Decode,
}

/// Complete node configuration
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Config {
    pub sampling: SamplingConfig,
    pub publish: PublishConfig,
    pub levels: LevelsConfig,
    pub alert: AlertConfig,
    pub gauge: GaugeConfig,
    pub link: LinkConfig,
    pub position: PositionConfig,
    pub sleep: SleepConfig,
}

/// Sensor sampling
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SamplingConfig {
    /// Period of the sample trigger timer
    pub interval_ms: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { interval_ms: 2_000 }
    }
}

/// Telemetry publishing
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct PublishConfig {
    /// Publish at least this often
    pub interval_ms: u32,
    /// Publish early once this distance has been covered
    pub distance_km: f32,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            interval_ms: 60_000,
            distance_km: 0.5,
        }
    }
}

/// Historical levels refresh
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct LevelsConfig {
    /// Minimum time between levels requests
    pub refresh_interval_ms: u32,
    /// Give up on a response after this long and disconnect
    pub response_timeout_ms: u32,
}

impl Default for LevelsConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 3_600_000,
            response_timeout_ms: 30_000,
        }
    }
}

/// Alert thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct AlertConfig {
    /// Maximum for pm1, pm2.5, pm4 and pm10 (µg/m³)
    pub pm_max: [f32; 4],
    /// Maximum CO2 (ppm)
    pub co2_max: u16,
    /// Flash period of the alert line
    pub flash_interval_ms: u16,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            pm_max: [25.0, 25.0, 40.0, 50.0],
            co2_max: 1_500,
            flash_interval_ms: 500,
        }
    }
}

/// Bar-scale gauges
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct GaugeConfig {
    /// Total gauge width including brackets
    pub width: u8,
    pub pm_min: f32,
    pub pm_max: f32,
    pub co2_min: f32,
    pub co2_max: f32,
}

impl Default for GaugeConfig {
    fn default() -> Self {
        Self {
            width: 12,
            pm_min: 0.0,
            pm_max: 50.0,
            co2_min: 400.0,
            co2_max: 2_000.0,
        }
    }
}

/// Display link
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct LinkConfig {
    /// Back-off between losing the display and scanning again
    pub backoff_ms: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self { backoff_ms: 5_000 }
    }
}

/// GPS receiver
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct PositionConfig {
    pub distance: DistanceStrategy,
    /// Receiver fix interval
    pub fix_interval_ms: u32,
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            distance: DistanceStrategy::SpeedIntegration,
            fix_interval_ms: 1_000,
        }
    }
}

/// Power-down behaviour
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SleepConfig {
    /// Also wake periodically while ignition stays off
    pub check_interval_ms: Option<u32>,
}

impl Config {
    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("sampling.interval_ms", self.sampling.interval_ms),
            ("publish.interval_ms", self.publish.interval_ms),
            ("levels.refresh_interval_ms", self.levels.refresh_interval_ms),
            ("levels.response_timeout_ms", self.levels.response_timeout_ms),
            ("alert.flash_interval_ms", self.alert.flash_interval_ms as u32),
            ("link.backoff_ms", self.link.backoff_ms),
            ("position.fix_interval_ms", self.position.fix_interval_ms),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::ZeroInterval(*name));
        }
        if self.sleep.check_interval_ms == Some(0) {
            return Err(ConfigError::ZeroInterval("sleep.check_interval_ms"));
        }

        // NaN fails this comparison too
        if !(self.publish.distance_km > 0.0) {
            return Err(ConfigError::InvalidPublishDistance);
        }

        let gauge = &self.gauge;
        if !(gauge.pm_max > gauge.pm_min) {
            return Err(ConfigError::InvalidGaugeRange("pm"));
        }
        if !(gauge.co2_max > gauge.co2_min) {
            return Err(ConfigError::InvalidGaugeRange("co2"));
        }
        let width = gauge.width as usize;
        if !(3..=DISPLAY_COLS - GAUGE_ROW_OVERHEAD).contains(&width) {
            return Err(ConfigError::InvalidGaugeWidth);
        }

        Ok(())
    }

    /// Decode a postcard-encoded configuration
    #[cfg(feature = "serde")]
    pub fn from_postcard(bytes: &[u8]) -> Result<Self, ConfigError> {
        postcard::from_bytes(bytes).map_err(|_| ConfigError::Decode)
    }
}
