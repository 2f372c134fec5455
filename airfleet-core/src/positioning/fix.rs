//! Position fix types

use core::fmt;

use heapless::String;

/// Length of a formatted `YYYY-MM-DD HH:MM:SS` timestamp
pub const DATETIME_LEN: usize = 19;

/// Fix validity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Validity {
    /// Nothing framed from the receiver yet
    #[default]
    NoData,
    /// Sentences arrive but none has carried a fix (or the fix was lost)
    Searching,
    Valid,
}

/// UTC calendar timestamp from the receiver
///
/// The receiver only sends a two-digit year; it is mapped to 20YY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UtcDateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl UtcDateTime {
    /// `YYYY-MM-DD HH:MM:SS`
    pub fn format(&self) -> String<DATETIME_LEN> {
        let mut out = String::new();
        // 19 characters always fit, a u16 year cannot exceed four digits here
        let _ = fmt::write(&mut out, format_args!("{}", self));
        out
    }
}

impl fmt::Display for UtcDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Last known position state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PositionFix {
    /// Decimal degrees, south negative
    pub latitude: f64,
    /// Decimal degrees, west negative
    pub longitude: f64,
    pub speed_kmh: f32,
    /// Accumulated since the last reset
    pub distance_km: f64,
    pub datetime: UtcDateTime,
    pub validity: Validity,
}

impl PositionFix {
    pub fn is_valid(&self) -> bool {
        self.validity == Validity::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_datetime_renders_zeros() {
        assert_eq!(UtcDateTime::default().format().as_str(), "0000-00-00 00:00:00");
    }

    #[test]
    fn test_datetime_zero_padded() {
        let dt = UtcDateTime {
            year: 2024,
            month: 3,
            day: 7,
            hour: 4,
            minute: 5,
            second: 9,
        };
        assert_eq!(dt.format().as_str(), "2024-03-07 04:05:09");
    }

    #[test]
    fn test_default_fix_has_no_data() {
        let fix = PositionFix::default();
        assert_eq!(fix.validity, Validity::NoData);
        assert!(!fix.is_valid());
        assert_eq!(fix.distance_km, 0.0);
    }
}
