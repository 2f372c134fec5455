//! Distance accumulation strategies

use libm::{asin, cos, sin, sqrt};

/// Mean Earth radius used for great-circle deltas
pub const EARTH_RADIUS_KM: f64 = 6371.0;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// How travelled distance is accumulated between valid fixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum DistanceStrategy {
    /// Reported speed times the time since the previous fix
    #[default]
    SpeedIntegration,
    /// Great-circle delta between consecutive fix positions
    Haversine,
}

/// Great-circle distance in km between two points in decimal degrees
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let s1 = sin(dphi / 2.0);
    let s2 = sin(dlambda / 2.0);
    let a = s1 * s1 + cos(phi1) * cos(phi2) * s2 * s2;
    2.0 * EARTH_RADIUS_KM * asin(sqrt(a.clamp(0.0, 1.0)))
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Anchor {
    at_ms: u32,
    latitude: f64,
    longitude: f64,
}

/// Running distance total
///
/// The total only ever grows; [`reset`](Self::reset) is the one way back to zero.
/// The previous valid fix is kept however long the gap, reset included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceAccumulator {
    strategy: DistanceStrategy,
    total_km: f64,
    anchor: Option<Anchor>,
}

impl DistanceAccumulator {
    pub const fn new(strategy: DistanceStrategy) -> Self {
        Self {
            strategy,
            total_km: 0.0,
            anchor: None,
        }
    }

    pub fn total_km(&self) -> f64 {
        self.total_km
    }

    /// Account for a valid fix observed at `now_ms`
    pub fn on_fix(&mut self, now_ms: u32, latitude: f64, longitude: f64, speed_kmh: f32) {
        if let Some(prev) = self.anchor {
            let delta = match self.strategy {
                DistanceStrategy::SpeedIntegration => {
                    let elapsed = now_ms.wrapping_sub(prev.at_ms) as f64;
                    f64::from(speed_kmh) / MS_PER_HOUR * elapsed
                }
                DistanceStrategy::Haversine => {
                    haversine_km(prev.latitude, prev.longitude, latitude, longitude)
                }
            };
            if delta.is_finite() && delta > 0.0 {
                self.total_km += delta;
            }
        }
        self.anchor = Some(Anchor {
            at_ms: now_ms,
            latitude,
            longitude,
        });
    }

    /// Zero the total; the previous fix stays so the next delta is not lost
    pub fn reset(&mut self) {
        self.total_km = 0.0;
    }
}
