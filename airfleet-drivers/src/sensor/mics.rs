//! SGX MiCS-VZ-89TE VOC and CO2 sensor
//!
//! The status command returns seven bytes: VOC and CO2 equivalents as raw
//! bytes, four diagnostic bytes and a sum-with-carry checksum.

use airfleet_core::traits::{GasReading, Sensor, SensorError};
use airfleet_protocol::checksum::mics_checksum;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::Conversion;

pub const ADDRESS: u8 = 0x70;

/// Get-status command code
pub const GET_STATUS: u8 = 0x0C;

pub const CONVERSION_MS: u32 = 100;

pub const REPLY_LEN: usize = 7;

/// Raw byte value at the bottom of both ranges
const RAW_OFFSET: u16 = 13;

/// Command frame with its checksum
pub fn status_command() -> [u8; 6] {
    let mut frame = [GET_STATUS, 0, 0, 0, 0, 0];
    frame[5] = mics_checksum(&frame[..5]);
    frame
}

/// Decode a status reply
///
/// VOC = (b0 - 13) * 1000 / 229 ppb, CO2 = (b1 - 13) * 1600 / 400 + 400 ppm.
pub fn decode(reply: &[u8; REPLY_LEN]) -> Result<GasReading, SensorError> {
    if mics_checksum(&reply[..6]) != reply[6] {
        return Err(SensorError::Checksum);
    }
    let voc = u32::from(u16::from(reply[0]).saturating_sub(RAW_OFFSET)) * 1_000 / 229;
    let co2 = u32::from(u16::from(reply[1]).saturating_sub(RAW_OFFSET)) * 1_600 / 400 + 400;
    Ok(GasReading {
        voc: u16::try_from(voc).unwrap_or(u16::MAX),
        co2: u16::try_from(co2).unwrap_or(u16::MAX),
    })
}

pub struct Mics<I2C, D> {
    i2c: I2C,
    delay: D,
    powered: bool,
    conversion: Conversion,
}

impl<I2C: I2c, D: DelayNs> Mics<I2C, D> {
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self {
            i2c,
            delay,
            powered: false,
            conversion: Conversion::default(),
        }
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn start_conversion(&mut self, now_ms: u32) -> Result<(), SensorError> {
        self.i2c
            .write(ADDRESS, &status_command())
            .map_err(|_| SensorError::Bus)?;
        self.conversion.start(now_ms);
        Ok(())
    }
}

impl<I2C: I2c, D: DelayNs> Sensor for Mics<I2C, D> {
    type Reading = GasReading;

    /// Always powered; only the sampling state is tracked
    fn on(&mut self) -> Result<(), SensorError> {
        self.powered = true;
        self.conversion.cancel();
        Ok(())
    }

    fn off(&mut self) -> Result<(), SensorError> {
        self.powered = false;
        self.conversion.cancel();
        Ok(())
    }

    fn service(&mut self, now_ms: u32) {
        if self.powered && !self.conversion.is_pending() {
            let _ = self.start_conversion(now_ms);
        }
    }

    fn sample(&mut self, now_ms: u32) -> Result<GasReading, SensorError> {
        if !self.powered {
            return Err(SensorError::NotPowered);
        }
        if !self.conversion.is_pending() {
            self.start_conversion(now_ms)?;
        }
        let wait = self.conversion.remaining(now_ms, CONVERSION_MS);
        if wait > 0 {
            self.delay.delay_ms(wait);
        }
        self.conversion.cancel();

        let mut reply = [0u8; REPLY_LEN];
        self.i2c
            .read(ADDRESS, &mut reply)
            .map_err(|_| SensorError::Bus)?;
        decode(&reply)
    }
}
