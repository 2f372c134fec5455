//! Positioning stream processor
//!
//! Consumes the receiver's byte stream one byte at a time and keeps the last
//! known fix. Bad input never clears a good fix: checksum failures, malformed
//! sentences and overflows are counted and dropped. A no-fix sentence marks
//! the fix as searching but distance still counts from the last valid fix.

use super::distance::{DistanceAccumulator, DistanceStrategy};
use super::fix::{PositionFix, Validity};
use super::framer::{Framed, FramerStats, SentenceFramer};
use super::sentence::{self, Rmc, Sentence, SentenceError};

#[derive(Debug, Clone)]
pub struct PositionProcessor {
    framer: SentenceFramer,
    distance: DistanceAccumulator,
    fix: PositionFix,
    ever_valid: bool,
}

impl PositionProcessor {
    pub fn new(strategy: DistanceStrategy) -> Self {
        Self {
            framer: SentenceFramer::new(),
            distance: DistanceAccumulator::new(strategy),
            fix: PositionFix::default(),
            ever_valid: false,
        }
    }

    /// Consume one byte received at `now_ms`
    pub fn feed(&mut self, byte: u8, now_ms: u32) {
        match self.framer.feed(byte) {
            Some(Framed::Sentence) => self.on_sentence(now_ms),
            Some(Framed::Overflow) => {
                warn!("gps sentence overflow");
                self.on_bad_sentence();
            }
            None => {}
        }
    }

    pub fn feed_bytes(&mut self, bytes: &[u8], now_ms: u32) {
        for &byte in bytes {
            self.feed(byte, now_ms);
        }
    }

    pub fn fix(&self) -> PositionFix {
        self.fix
    }

    pub fn reset_distance(&mut self) {
        self.distance.reset();
        self.fix.distance_km = 0.0;
    }

    pub fn stats(&self) -> FramerStats {
        self.framer.stats
    }

    fn on_sentence(&mut self, now_ms: u32) {
        match sentence::parse(self.framer.sentence()) {
            Ok(Sentence::Rmc(rmc)) => self.apply(rmc, now_ms),
            Ok(Sentence::Other) => {
                self.framer.stats.ignored = self.framer.stats.ignored.wrapping_add(1);
            }
            Err(SentenceError::Checksum) => {
                warn!("gps checksum mismatch");
                self.framer.stats.checksum_failures =
                    self.framer.stats.checksum_failures.wrapping_add(1);
                self.on_bad_sentence();
            }
            Err(SentenceError::Malformed) => {
                warn!("gps sentence malformed");
                self.framer.stats.malformed = self.framer.stats.malformed.wrapping_add(1);
                self.on_bad_sentence();
            }
        }
    }

    fn on_bad_sentence(&mut self) {
        if !self.ever_valid {
            self.fix.validity = Validity::Searching;
        }
    }

    fn apply(&mut self, rmc: Rmc, now_ms: u32) {
        if let Some(datetime) = rmc.datetime {
            self.fix.datetime = datetime;
        }

        match rmc.position {
            Some(position) => {
                self.distance.on_fix(
                    now_ms,
                    position.latitude,
                    position.longitude,
                    position.speed_kmh,
                );
                self.fix.latitude = position.latitude;
                self.fix.longitude = position.longitude;
                self.fix.speed_kmh = position.speed_kmh;
                self.fix.distance_km = self.distance.total_km();
                if self.fix.validity != Validity::Valid {
                    debug!("gps fix acquired");
                }
                self.fix.validity = Validity::Valid;
                self.ever_valid = true;
            }
            None => {
                if self.fix.validity == Validity::Valid {
                    debug!("gps fix lost");
                }
                self.fix.validity = Validity::Searching;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FIX: &[u8] =
        b"$GNRMC,135030.000,A,5626.2161,N,00922.2802,E,0.00,294.78,261124,,,A*74\r\n";
    const NO_FIX: &[u8] = b"$GNRMC,135031.000,V,,,,,0.00,0.00,261124,,,N*54\r\n";
    const GGA: &[u8] =
        b"$GNGGA,135030.000,5626.2161,N,00922.2802,E,1,08,1.0,10.0,M,40.0,M,,*78\r\n";
    const FAST: &[u8] =
        b"$GNRMC,135032.000,A,3352.1280,S,15112.5520,W,100.00,0.00,261124,,,A*72\r\n";

    fn processor() -> PositionProcessor {
        PositionProcessor::new(DistanceStrategy::SpeedIntegration)
    }

    #[test]
    fn test_end_to_end_fix() {
        let mut gps = processor();
        gps.feed_bytes(FIX, 0);

        let fix = gps.fix();
        assert_eq!(fix.validity, Validity::Valid);
        assert!((fix.latitude - 56.4369).abs() < 1e-4);
        assert!((fix.longitude - 9.3713).abs() < 1e-4);
        assert_eq!(fix.speed_kmh, 0.0);
        assert_eq!(fix.datetime.format().as_str(), "2024-11-26 13:50:30");
        assert_eq!(gps.stats().sentences, 1);
    }

    #[test]
    fn test_starts_without_data() {
        assert_eq!(processor().fix().validity, Validity::NoData);
    }

    #[test]
    fn test_bad_checksum_before_first_fix_is_searching() {
        let mut gps = processor();
        gps.feed_bytes(
            b"$GNRMC,135030.000,A,5626.2161,N,00922.2802,E,0.00,294.78,261124,,,A*00\r",
            0,
        );
        assert_eq!(gps.fix().validity, Validity::Searching);
        assert_eq!(gps.stats().checksum_failures, 1);
    }

    #[test]
    fn test_bad_checksum_after_fix_keeps_fix() {
        let mut gps = processor();
        gps.feed_bytes(FIX, 0);
        let before = gps.fix();
        gps.feed_bytes(
            b"$GNRMC,135040.000,A,1111.1111,N,02222.2222,E,9.00,294.78,261124,,,A*00\r",
            1000,
        );
        assert_eq!(gps.fix(), before);
    }

    #[test]
    fn test_overflow_keeps_fix() {
        let mut gps = processor();
        gps.feed_bytes(FIX, 0);
        let before = gps.fix();
        gps.feed(b'$', 10);
        for _ in 0..200 {
            gps.feed(b'9', 10);
        }
        gps.feed(b'\r', 10);
        assert_eq!(gps.fix(), before);
        assert_eq!(gps.stats().overflows, 1);
    }

    #[test]
    fn test_other_sentences_ignored() {
        let mut gps = processor();
        gps.feed_bytes(GGA, 0);
        assert_eq!(gps.fix().validity, Validity::NoData);
        assert_eq!(gps.stats().ignored, 1);

        gps.feed_bytes(FIX, 0);
        gps.feed_bytes(GGA, 1000);
        assert_eq!(gps.fix().validity, Validity::Valid);
    }

    #[test]
    fn test_lost_fix_keeps_position_and_updates_time() {
        let mut gps = processor();
        gps.feed_bytes(FIX, 0);
        gps.feed_bytes(NO_FIX, 1000);

        let fix = gps.fix();
        assert_eq!(fix.validity, Validity::Searching);
        assert!((fix.latitude - 56.4369).abs() < 1e-4);
        assert_eq!(fix.datetime.format().as_str(), "2024-11-26 13:50:31");
    }

    #[test]
    fn test_speed_integration_accumulates_and_resets() {
        let mut gps = processor();
        gps.feed_bytes(FAST, 0);
        gps.feed_bytes(FAST, 3_600_000);
        // 100 knots is reported as 53.996 km/h, held for an hour
        assert!((gps.fix().distance_km - 53.996).abs() < 0.01);

        gps.reset_distance();
        assert_eq!(gps.fix().distance_km, 0.0);
    }

    #[test]
    fn test_haversine_between_fixes() {
        let mut gps = PositionProcessor::new(DistanceStrategy::Haversine);
        gps.feed_bytes(FIX, 0);
        gps.feed_bytes(
            b"$GNRMC,135030.000,A,5626.2207,N,00922.2802,E,0.00,294.78,261124,,,A*77\r\n",
            1000,
        );
        // 0.0046 arc minutes of latitude
        assert!((gps.fix().distance_km - 0.00852).abs() < 1e-4);
    }

    #[test]
    fn test_speed_integration_spans_no_fix() {
        let mut gps = processor();
        gps.feed_bytes(FAST, 0);
        gps.feed_bytes(NO_FIX, 1_000);
        assert_eq!(gps.fix().validity, Validity::Searching);
        gps.feed_bytes(FAST, 3_600_000);
        // Elapsed time runs from the fix at 0, not from the no-fix sentence
        assert!((gps.fix().distance_km - 53.996).abs() < 0.01);
    }

    #[test]
    fn test_haversine_spans_no_fix() {
        let mut gps = PositionProcessor::new(DistanceStrategy::Haversine);
        gps.feed_bytes(FIX, 0);
        gps.feed_bytes(NO_FIX, 1_000);
        gps.feed_bytes(
            b"$GNRMC,135030.000,A,5626.2207,N,00922.2802,E,0.00,294.78,261124,,,A*77\r\n",
            2_000,
        );
        assert_eq!(gps.fix().validity, Validity::Valid);
        assert!((gps.fix().distance_km - 0.00852).abs() < 1e-4);
    }

    #[test]
    fn test_reset_counts_from_last_fix() {
        let mut gps = processor();
        gps.feed_bytes(FAST, 0);
        gps.reset_distance();
        assert_eq!(gps.fix().distance_km, 0.0);
        gps.feed_bytes(FAST, 3_600_000);
        assert!((gps.fix().distance_km - 53.996).abs() < 0.01);
    }

    proptest! {
        #[test]
        fn test_noise_never_loses_distance(noise in prop::collection::vec(any::<u8>(), 0..512)) {
            let mut gps = processor();
            gps.feed_bytes(FIX, 0);
            let before = gps.fix();
            gps.feed_bytes(&noise, 10);
            prop_assert!(gps.fix().distance_km >= before.distance_km);
            prop_assert_ne!(gps.fix().validity, Validity::NoData);
        }
    }
}
