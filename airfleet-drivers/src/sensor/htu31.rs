//! TE HTU31D temperature and humidity sensor

use airfleet_core::traits::{ClimateReading, Sensor, SensorError};
use airfleet_protocol::checksum::htu31_crc8;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::{checked_words, Conversion};

/// I2C address with the address pin low
pub const ADDRESS: u8 = 0x40;

pub mod cmd {
    pub const RESET: u8 = 0x1E;
    /// Start temperature and humidity conversion at the highest resolution
    pub const CONVERSION: u8 = 0x40;
    pub const READ_T_RH: u8 = 0x00;
}

/// 1.0 ms humidity plus 1.6 ms temperature, rounded up
pub const CONVERSION_MS: u32 = 3;

const RESET_MS: u32 = 15;

/// Temperature and humidity words, each followed by a CRC byte
pub const REPLY_LEN: usize = 6;

const FULL_SCALE: f32 = 65_535.0;

pub struct Htu31<I2C, D> {
    i2c: I2C,
    delay: D,
    powered: bool,
    conversion: Conversion,
}

impl<I2C: I2c, D: DelayNs> Htu31<I2C, D> {
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

    fn command(&mut self, command: u8) -> Result<(), SensorError> {
        self.i2c
            .write(ADDRESS, &[command])
            .map_err(|_| SensorError::Bus)
    }

    fn start_conversion(&mut self, now_ms: u32) -> Result<(), SensorError> {
        self.command(cmd::CONVERSION)?;
        self.conversion.start(now_ms);
        Ok(())
    }
}

/// Decode a temperature and humidity reply
///
/// T = -40 + 165 * t / 65535 °C, RH = 100 * h / 65535 %. A raw zero in
/// either word is what the sensor returns without a completed conversion.
pub fn decode(reply: &[u8; REPLY_LEN]) -> Result<ClimateReading, SensorError> {
    let [t, h] = checked_words::<2>(reply, htu31_crc8)?;
    if t == 0 || h == 0 {
        return Err(SensorError::InvalidReading);
    }
    Ok(ClimateReading {
        temperature: -40.0 + 165.0 * f32::from(t) / FULL_SCALE,
        humidity: 100.0 * f32::from(h) / FULL_SCALE,
    })
}

impl<I2C: I2c, D: DelayNs> Sensor for Htu31<I2C, D> {
    type Reading = ClimateReading;

    fn on(&mut self) -> Result<(), SensorError> {
        self.command(cmd::RESET)?;
        self.delay.delay_ms(RESET_MS);
        self.powered = true;
        self.conversion.cancel();
        Ok(())
    }

    /// The HTU31 idles in its low power state between conversions
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

    fn sample(&mut self, now_ms: u32) -> Result<ClimateReading, SensorError> {
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
            .write_read(ADDRESS, &[cmd::READ_T_RH], &mut reply)
            .map_err(|_| SensorError::Bus)?;
        decode(&reply)
    }
}
