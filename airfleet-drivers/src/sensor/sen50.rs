//! Sensirion SEN50 particulate matter sensor
//!
//! The SEN50 measures continuously once started. Each read-values command
//! latches the latest measurement, which becomes readable 20 ms later as
//! eight CRC protected words; only the four mass concentrations are used.

use airfleet_core::traits::{ParticulateReading, Sensor, SensorError};
use airfleet_protocol::checksum::sensirion_crc8;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::{checked_words, Conversion};

/// Fixed I2C address
pub const ADDRESS: u8 = 0x69;

/// Command words, sent big-endian
pub mod cmd {
    pub const START_MEASUREMENT: [u8; 2] = [0x00, 0x21];
    pub const STOP_MEASUREMENT: [u8; 2] = [0x01, 0x04];
    pub const READ_VALUES: [u8; 2] = [0x03, 0xC4];
}

/// Delay between read-values and the reply
pub const CONVERSION_MS: u32 = 20;

/// Settling time after starting measurement
const STARTUP_MS: u32 = 50;

/// Eight words, each followed by a CRC byte
pub const REPLY_LEN: usize = 24;

/// Mass concentrations are reported in 0.1 µg/m³
const MASS_SCALE: f32 = 10.0;

pub struct Sen50<I2C, D> {
    i2c: I2C,
    delay: D,
    powered: bool,
    conversion: Conversion,
}

impl<I2C: I2c, D: DelayNs> Sen50<I2C, D> {
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

    fn command(&mut self, command: [u8; 2]) -> Result<(), SensorError> {
        self.i2c
            .write(ADDRESS, &command)
            .map_err(|_| SensorError::Bus)
    }

    fn start_conversion(&mut self, now_ms: u32) -> Result<(), SensorError> {
        self.command(cmd::READ_VALUES)?;
        self.conversion.start(now_ms);
        Ok(())
    }
}

/// Decode a read-values reply
///
/// A zero in any mass channel means the sensor has no valid measurement
/// yet (it reports zero while the fan spins up), so it is rejected.
pub fn decode(reply: &[u8; REPLY_LEN]) -> Result<ParticulateReading, SensorError> {
    let [pm1, pm25, pm4, pm10] = checked_words::<4>(reply, sensirion_crc8)?;
    if [pm1, pm25, pm4, pm10].contains(&0) {
        return Err(SensorError::InvalidReading);
    }
    Ok(ParticulateReading {
        pm1: f32::from(pm1) / MASS_SCALE,
        pm25: f32::from(pm25) / MASS_SCALE,
        pm4: f32::from(pm4) / MASS_SCALE,
        pm10: f32::from(pm10) / MASS_SCALE,
    })
}

impl<I2C: I2c, D: DelayNs> Sensor for Sen50<I2C, D> {
    type Reading = ParticulateReading;

    fn on(&mut self) -> Result<(), SensorError> {
        self.command(cmd::START_MEASUREMENT)?;
        self.delay.delay_ms(STARTUP_MS);
        self.powered = true;
        self.conversion.cancel();
        Ok(())
    }

    fn off(&mut self) -> Result<(), SensorError> {
        self.powered = false;
        self.conversion.cancel();
        self.command(cmd::STOP_MEASUREMENT)
    }

    fn service(&mut self, now_ms: u32) {
        if self.powered && !self.conversion.is_pending() {
            // A failed start is retried here and reported by `sample`
            let _ = self.start_conversion(now_ms);
        }
    }

    fn sample(&mut self, now_ms: u32) -> Result<ParticulateReading, SensorError> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::mock::{RecordingDelay, ScriptedBus};

    /// pm1 3.2, pm2.5 5.0, pm4 6.4, pm10 7.0, then four unused words
    const REPLY: [u8; REPLY_LEN] = [
        0x00, 0x20, 0x07, 0x00, 0x32, 0x26, 0x00, 0x40, 0xBC, 0x00, 0x46, 0x1A, //
        0xFF, 0xFF, 0xAC, 0xFF, 0xFF, 0xAC, 0xFF, 0xFF, 0xAC, 0xFF, 0xFF, 0xAC,
    ];

    fn sensor() -> Sen50<ScriptedBus, RecordingDelay> {
        Sen50::new(ScriptedBus::default(), RecordingDelay::default())
    }

    #[test]
    fn test_decode() {
        let reading = decode(&REPLY).unwrap();
        assert_eq!(reading.pm1, 3.2);
        assert_eq!(reading.pm25, 5.0);
        assert_eq!(reading.pm4, 6.4);
        assert_eq!(reading.pm10, 7.0);
    }

    #[test]
    fn test_decode_checksum_mismatch() {
        let mut reply = REPLY;
        reply[4] ^= 0x01;
        assert_eq!(decode(&reply), Err(SensorError::Checksum));
    }

    #[test]
    fn test_decode_zero_channel_rejected() {
        let mut reply = REPLY;
        reply[6..9].copy_from_slice(&[0x00, 0x00, 0x81]);
        assert_eq!(decode(&reply), Err(SensorError::InvalidReading));
    }

    #[test]
    fn test_sample_requires_power() {
        let mut sen50 = sensor();
        assert_eq!(sen50.sample(0), Err(SensorError::NotPowered));
        assert!(sen50.i2c.writes.is_empty());
    }

    #[test]
    fn test_on_and_off_commands() {
        let mut sen50 = sensor();
        sen50.on().unwrap();
        sen50.off().unwrap();
        assert_eq!(
            sen50.i2c.writes,
            [
                (ADDRESS, cmd::START_MEASUREMENT.to_vec()),
                (ADDRESS, cmd::STOP_MEASUREMENT.to_vec()),
            ]
        );
        assert_eq!(sen50.delay.waited_ms(), 50);
    }

    #[test]
    fn test_serviced_sample_does_not_wait() {
        let mut sen50 = sensor();
        sen50.on().unwrap();
        sen50.service(1_000);
        // A second service must not restart the pending conversion
        sen50.service(1_010);
        sen50.i2c.reply(&REPLY);

        let reading = sen50.sample(1_030).unwrap();
        assert_eq!(reading.pm25, 5.0);
        assert_eq!(sen50.i2c.writes.len(), 2);
        assert_eq!(sen50.delay.waited_ms(), 50);
    }

    #[test]
    fn test_unserviced_sample_waits_conversion() {
        let mut sen50 = sensor();
        sen50.on().unwrap();
        sen50.i2c.reply(&REPLY);

        sen50.sample(1_000).unwrap();
        assert_eq!(sen50.i2c.writes[1], (ADDRESS, cmd::READ_VALUES.to_vec()));
        assert_eq!(sen50.delay.waited_ms(), 50 + u64::from(CONVERSION_MS));
    }

    #[test]
    fn test_bus_error() {
        let mut sen50 = sensor();
        sen50.on().unwrap();
        sen50.i2c.fail = true;
        assert_eq!(sen50.sample(0), Err(SensorError::Bus));
    }

    #[test]
    fn test_truncated_reply_is_bus_error() {
        let mut sen50 = sensor();
        sen50.on().unwrap();
        sen50.i2c.reply(&REPLY[..10]);
        assert_eq!(sen50.sample(0), Err(SensorError::Bus));
    }
}
