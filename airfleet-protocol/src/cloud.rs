//! Cloud event payloads
//!
//! Outbound telemetry is a fixed-schema JSON object written with `core::fmt`
//! into a stack buffer. The inbound levels response is parsed with
//! `serde_json`; the backend formats its averages as strings, so each level
//! accepts either a JSON number or a numeric string.

use core::fmt::{self, Write};

use heapless::String;
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

/// Telemetry publish event
pub const PUBLISH_EVENT: &str = "airfleet_push";

/// Historical levels request event
pub const LEVELS_REQUEST_EVENT: &str = "airfleet_levels";

/// Event carrying the backend's levels response
pub const LEVELS_RESPONSE_EVENT: &str = "hook-response/airfleet_levels";

/// Capacity of an encoded telemetry payload
pub const MAX_PAYLOAD_LEN: usize = 256;

/// Longest inbound or outbound event name
pub const MAX_EVENT_NAME: usize = 48;

/// Longest event body that fits one bridge frame next to its name
pub const MAX_EVENT_DATA: usize = 200;

pub type EventName = String<MAX_EVENT_NAME>;
pub type EventData = String<MAX_EVENT_DATA>;

/// Encoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadError {
    /// Encoded payload does not fit [`MAX_PAYLOAD_LEN`]
    Overflow,
}

/// One telemetry record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryPayload<'a> {
    /// pm1, pm2.5, pm4, pm10 in µg/m³
    pub particulate: [f32; 4],
    pub temperature: f32,
    pub humidity: f32,
    pub voc: u16,
    pub co2: u16,
    pub latitude: f64,
    pub longitude: f64,
    /// `YYYY-MM-DD HH:MM:SS`
    pub time: &'a str,
}

impl TelemetryPayload<'_> {
    /// Encode as
    /// `{"pm1":F,"pm25":F,"pm4":F,"pm10":F,"temp":F,"humi":F,"voc":I,"co2":I,"lat":F6,"lng":F6,"time":"..."}`
    pub fn encode(&self) -> Result<String<MAX_PAYLOAD_LEN>, PayloadError> {
        let mut out = String::new();
        self.write(&mut out).map_err(|_| PayloadError::Overflow)?;
        Ok(out)
    }

    fn write(&self, out: &mut impl Write) -> fmt::Result {
        let [pm1, pm25, pm4, pm10] = self.particulate.map(finite);
        write!(
            out,
            "{{\"pm1\":{:.1},\"pm25\":{:.1},\"pm4\":{:.1},\"pm10\":{:.1},",
            pm1, pm25, pm4, pm10
        )?;
        write!(
            out,
            "\"temp\":{:.1},\"humi\":{:.1},",
            finite(self.temperature),
            finite(self.humidity)
        )?;
        write!(out, "\"voc\":{},\"co2\":{},", self.voc, self.co2)?;
        write!(
            out,
            "\"lat\":{:.6},\"lng\":{:.6},",
            finite64(self.latitude),
            finite64(self.longitude)
        )?;
        out.write_str("\"time\":\"")?;
        // Only the datetime string is caller supplied; keep it from breaking the JSON
        for c in self.time.chars().filter(|c| *c != '"' && *c != '\\') {
            out.write_char(c)?;
        }
        out.write_str("\"}")
    }
}

fn finite(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn finite64(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Levels parse errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LevelsError {
    /// Not a JSON object, or a level that is neither number nor numeric string
    Malformed,
}

/// Historical averages from the backend
///
/// Missing keys stay `None` so the receiver can leave its slot unchanged.
/// Unknown keys are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct LevelsUpdate {
    #[serde(default, deserialize_with = "level")]
    pub co2: Option<f32>,
    #[serde(default, deserialize_with = "level")]
    pub pm1: Option<f32>,
    #[serde(default, deserialize_with = "level")]
    pub pm25: Option<f32>,
    #[serde(default, deserialize_with = "level")]
    pub pm4: Option<f32>,
    #[serde(default, deserialize_with = "level")]
    pub pm10: Option<f32>,
}

impl LevelsUpdate {
    pub fn parse(data: &[u8]) -> Result<Self, LevelsError> {
        serde_json::from_slice(data).map_err(|_| LevelsError::Malformed)
    }
}

fn level<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LevelVisitor;

    impl<'de> Visitor<'de> for LevelVisitor {
        type Value = Option<f32>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number or a numeric string")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v as f32))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v as f32))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v as f32))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            v.trim()
                .parse::<f32>()
                .map(Some)
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(LevelVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TelemetryPayload<'static> {
        TelemetryPayload {
            particulate: [3.24, 5.0, 6.46, 7.0],
            temperature: 21.56,
            humidity: 40.0,
            voc: 120,
            co2: 612,
            latitude: 56.436935,
            longitude: 9.371337,
            time: "2024-11-26 13:50:30",
        }
    }

    #[test]
    fn test_payload_field_order_and_precision() {
        let payload = sample().encode().unwrap();
        assert_eq!(
            payload.as_str(),
            "{\"pm1\":3.2,\"pm25\":5.0,\"pm4\":6.5,\"pm10\":7.0,\"temp\":21.6,\"humi\":40.0,\
             \"voc\":120,\"co2\":612,\"lat\":56.436935,\"lng\":9.371337,\
             \"time\":\"2024-11-26 13:50:30\"}"
        );
    }

    #[test]
    fn test_payload_is_valid_json() {
        let payload = sample().encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["co2"], 612);
        assert_eq!(value["time"], "2024-11-26 13:50:30");
    }

    #[test]
    fn test_payload_non_finite_written_as_zero() {
        let mut record = sample();
        record.temperature = f32::NAN;
        record.latitude = f64::INFINITY;
        let payload = record.encode().unwrap();
        assert!(payload.contains("\"temp\":0.0"));
        assert!(payload.contains("\"lat\":0.000000"));
    }

    #[test]
    fn test_levels_numeric_strings() {
        let update = LevelsUpdate::parse(
            br#"{"co2":"512.3","pm1":"3.4","pm25":"5.5","pm4":"6.0","pm10":"8.1"}"#,
        )
        .unwrap();
        assert_eq!(update.co2, Some(512.3));
        assert_eq!(update.pm10, Some(8.1));
    }

    #[test]
    fn test_levels_numbers_missing_and_unknown() {
        let update = LevelsUpdate::parse(br#"{"co2":700,"pm25":4.5,"nox":1}"#).unwrap();
        assert_eq!(update.co2, Some(700.0));
        assert_eq!(update.pm25, Some(4.5));
        assert_eq!(update.pm1, None);
        assert_eq!(update.pm4, None);
    }

    #[test]
    fn test_levels_null_leaves_slot() {
        let update = LevelsUpdate::parse(br#"{"co2":null}"#).unwrap();
        assert_eq!(update.co2, None);
    }

    #[test]
    fn test_levels_malformed() {
        assert_eq!(LevelsUpdate::parse(b"not json"), Err(LevelsError::Malformed));
        assert_eq!(
            LevelsUpdate::parse(br#"{"co2":"high"}"#),
            Err(LevelsError::Malformed)
        );
        assert_eq!(LevelsUpdate::parse(b"42"), Err(LevelsError::Malformed));
    }
}
