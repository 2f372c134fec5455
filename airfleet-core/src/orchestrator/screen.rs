//! Screen layout on the 20x4 display
//!
//! ```text
//! PM [---|      ]  12
//! CO2[--+--     ] 812
//! 23.4C 45%   52.3km/h
//! HIGH PM+CO2    13:50
//! ```

use core::fmt::{self, Write};

use airfleet_protocol::link::DISPLAY_COLS;
use heapless::String;

use super::scale::generate_scale;
use crate::config::{AlertConfig, GaugeConfig};
use crate::positioning::{PositionFix, UtcDateTime, Validity};
use crate::traits::{GasReading, ParticulateReading};

pub type Line = String<DISPLAY_COLS>;

pub const PM_ROW: u8 = 0;
pub const CO2_ROW: u8 = 1;
pub const CLIMATE_ROW: u8 = 2;
pub const STATUS_ROW: u8 = 3;

pub const TEMPERATURE_COL: u8 = 0;
pub const HUMIDITY_COL: u8 = 6;
pub const SPEED_COL: u8 = 10;
pub const ALERT_COL: u8 = 0;
pub const CLOCK_COL: u8 = 15;

const TEMPERATURE_WIDTH: usize = 6;
const HUMIDITY_WIDTH: usize = 4;
const SPEED_WIDTH: usize = 10;
pub const ALERT_WIDTH: usize = 14;

/// Gauge values are shown in four columns
const GAUGE_VALUE_MAX: f32 = 9_999.0;

pub const POWERING_DOWN: &str = "Powering down";

/// Air quality alert shown on the status row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alert {
    None,
    Particulate,
    Co2,
    Both,
}

impl Alert {
    /// Any particulate fraction or CO2 above its maximum
    pub fn evaluate(
        particulate: Option<&ParticulateReading>,
        gas: Option<&GasReading>,
        limits: &AlertConfig,
    ) -> Self {
        let pm = particulate.is_some_and(|r| {
            r.as_array()
                .iter()
                .zip(limits.pm_max.iter())
                .any(|(value, max)| value > max)
        });
        let co2 = gas.is_some_and(|g| g.co2 > limits.co2_max);
        match (pm, co2) {
            (false, false) => Alert::None,
            (true, false) => Alert::Particulate,
            (false, true) => Alert::Co2,
            (true, true) => Alert::Both,
        }
    }

    pub fn is_active(&self) -> bool {
        *self != Alert::None
    }

    pub fn text(&self) -> &'static str {
        match self {
            Alert::None => "OK",
            Alert::Particulate => "HIGH PM",
            Alert::Co2 => "HIGH CO2",
            Alert::Both => "HIGH PM+CO2",
        }
    }
}

/// Format into a line, padding with spaces to `width`
///
/// Output that does not fit a display row is cut at the row end.
pub fn padded(width: usize, args: fmt::Arguments<'_>) -> Line {
    let mut out = Truncating(Line::new());
    let _ = out.write_fmt(args);
    let mut line = out.0;
    while line.len() < width.min(DISPLAY_COLS) {
        let _ = line.push(' ');
    }
    line
}

/// Writer that drops whatever does not fit
struct Truncating(Line);

impl Write for Truncating {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// `LBL[scale] VVVV`
fn gauge_row(label: &str, value: f32, min: f32, max: f32, reference: f32, width: u8) -> Line {
    let scale = generate_scale(value, min, max, reference, width as usize);
    let shown = if value.is_finite() {
        value.clamp(0.0, GAUGE_VALUE_MAX)
    } else {
        0.0
    };
    padded(
        DISPLAY_COLS,
        format_args!("{:<3}{} {:>4.0}", label, scale, shown),
    )
}

pub fn particulate_row(reading: &ParticulateReading, reference: f32, gauge: &GaugeConfig) -> Line {
    gauge_row(
        "PM",
        reading.max(),
        gauge.pm_min,
        gauge.pm_max,
        reference,
        gauge.width,
    )
}

pub fn co2_row(gas: &GasReading, reference: f32, gauge: &GaugeConfig) -> Line {
    gauge_row(
        "CO2",
        f32::from(gas.co2),
        gauge.co2_min,
        gauge.co2_max,
        reference,
        gauge.width,
    )
}

pub fn temperature(celsius: f32) -> Line {
    padded(TEMPERATURE_WIDTH, format_args!("{:.1}C", celsius))
}

pub fn humidity(percent: f32) -> Line {
    padded(HUMIDITY_WIDTH, format_args!("{:.0}%", percent))
}

/// Speed, or why there is none
pub fn speed(fix: &PositionFix) -> Line {
    match fix.validity {
        Validity::Valid => padded(SPEED_WIDTH, format_args!("{:>6.1}km/h", fix.speed_kmh)),
        Validity::Searching => padded(SPEED_WIDTH, format_args!("{:>10}", "NO FIX")),
        Validity::NoData => padded(SPEED_WIDTH, format_args!("{:>10}", "NO GPS")),
    }
}

/// `HH:MM`, or dashes until the receiver has sent a time
pub fn clock(datetime: &UtcDateTime) -> Line {
    if datetime.year == 0 {
        return padded(0, format_args!("--:--"));
    }
    padded(
        0,
        format_args!("{:02}:{:02}", datetime.hour, datetime.minute),
    )
}

pub fn status(alert: Alert) -> Line {
    let text = if alert.is_active() { "" } else { alert.text() };
    padded(ALERT_WIDTH, format_args!("{}", text))
}
