//! RMC sentence decoding
//!
//! Works on a framed sentence body, i.e. everything between `$` and CR:
//! `GNRMC,hhmmss.sss,A,DDMM.MMMM,N,DDDMM.MMMM,E,knots,course,DDMMYY,...*HH`

use airfleet_protocol::checksum::verify_sentence;

use super::fix::UtcDateTime;

/// Tag of the one interpreted sentence type, `$` excluded
pub const RMC_TAG: &[u8] = b"GNRMC,";

/// Fields up to and including the date
const RMC_MIN_FIELDS: usize = 10;

const FIELD_TIME: usize = 1;
const FIELD_STATUS: usize = 2;
const FIELD_LAT: usize = 3;
const FIELD_LAT_HEMI: usize = 4;
const FIELD_LON: usize = 5;
const FIELD_LON_HEMI: usize = 6;
const FIELD_SPEED: usize = 7;
const FIELD_DATE: usize = 9;

/// Knots are divided by this to get the reported speed
pub const KNOTS_DIVISOR: f32 = 1.852;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SentenceError {
    Checksum,
    Malformed,
}

/// Position part of an RMC sentence flagged `A`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RmcPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub speed_kmh: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rmc {
    /// `None` when the receiver has no time yet
    pub datetime: Option<UtcDateTime>,
    /// `None` when the status flag is anything but `A`
    pub position: Option<RmcPosition>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sentence {
    Rmc(Rmc),
    /// Some other tag, left uninterpreted
    Other,
}

/// Parse a framed sentence body
pub fn parse(raw: &[u8]) -> Result<Sentence, SentenceError> {
    if !raw.starts_with(RMC_TAG) {
        return Ok(Sentence::Other);
    }

    let star = raw
        .iter()
        .rposition(|&b| b == b'*')
        .ok_or(SentenceError::Malformed)?;
    let (body, hex) = (&raw[..star], &raw[star + 1..]);
    if !verify_sentence(body, hex) {
        return Err(SentenceError::Checksum);
    }

    let mut fields: [&[u8]; RMC_MIN_FIELDS] = [&[]; RMC_MIN_FIELDS];
    let mut count = 0;
    for field in body.split(|&b| b == b',') {
        if let Some(slot) = fields.get_mut(count) {
            *slot = field;
        }
        count += 1;
    }
    if count < RMC_MIN_FIELDS {
        return Err(SentenceError::Malformed);
    }

    let position = if fields[FIELD_STATUS] == b"A" {
        Some(position(&fields)?)
    } else {
        None
    };

    Ok(Sentence::Rmc(Rmc {
        datetime: datetime(fields[FIELD_DATE], fields[FIELD_TIME]),
        position,
    }))
}

fn position(fields: &[&[u8]; RMC_MIN_FIELDS]) -> Result<RmcPosition, SentenceError> {
    let latitude = degrees_minutes(fields[FIELD_LAT])
        .filter(|v| *v <= 90.0)
        .ok_or(SentenceError::Malformed)?;
    let longitude = degrees_minutes(fields[FIELD_LON])
        .filter(|v| *v <= 180.0)
        .ok_or(SentenceError::Malformed)?;

    let latitude = match fields[FIELD_LAT_HEMI] {
        b"N" => latitude,
        b"S" => -latitude,
        _ => return Err(SentenceError::Malformed),
    };
    let longitude = match fields[FIELD_LON_HEMI] {
        b"E" => longitude,
        b"W" => -longitude,
        _ => return Err(SentenceError::Malformed),
    };

    Ok(RmcPosition {
        latitude,
        longitude,
        speed_kmh: speed_kmh(fields[FIELD_SPEED])?,
    })
}

/// Decode `DDMM.MMMM` / `DDDMM.MMMM` into decimal degrees
///
/// The last two whole digits before the point start the minutes; everything
/// before them is degrees.
pub fn degrees_minutes(field: &[u8]) -> Option<f64> {
    let text = core::str::from_utf8(field).ok()?;
    let whole = text.find('.').unwrap_or(text.len());
    if whole < 3 {
        return None;
    }
    let (degrees, minutes) = text.split_at(whole - 2);
    if !degrees.bytes().all(|b| b.is_ascii_digit())
        || !minutes.bytes().all(|b| b.is_ascii_digit() || b == b'.')
    {
        return None;
    }
    let degrees: f64 = degrees.parse().ok()?;
    let minutes: f64 = minutes.parse().ok()?;
    if minutes >= 60.0 {
        return None;
    }
    Some(degrees + minutes / 60.0)
}

fn speed_kmh(field: &[u8]) -> Result<f32, SentenceError> {
    if field.is_empty() {
        return Ok(0.0);
    }
    let knots: f32 = core::str::from_utf8(field)
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|v: &f32| v.is_finite() && *v >= 0.0)
        .ok_or(SentenceError::Malformed)?;
    Ok(knots / KNOTS_DIVISOR)
}

fn two_digits(field: &[u8], at: usize) -> Option<u8> {
    match field.get(at..at + 2)? {
        [hi @ b'0'..=b'9', lo @ b'0'..=b'9'] => Some((hi - b'0') * 10 + (lo - b'0')),
        _ => None,
    }
}

/// `DDMMYY` plus `hhmmss[.sss]`; the century is always 20
fn datetime(date: &[u8], time: &[u8]) -> Option<UtcDateTime> {
    if date.len() != 6 || time.len() < 6 {
        return None;
    }
    Some(UtcDateTime {
        year: 2000 + u16::from(two_digits(date, 4)?),
        month: two_digits(date, 2)?,
        day: two_digits(date, 0)?,
        hour: two_digits(time, 0)?,
        minute: two_digits(time, 2)?,
        second: two_digits(time, 4)?,
    })
}
