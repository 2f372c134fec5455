//! Quectel L86 GPS receiver
//!
//! The receiver streams NMEA over a UART. `service` drains whatever the
//! UART has buffered into a [`PositionProcessor`]; nothing here waits for
//! a sentence to complete.

use core::convert::Infallible;

use airfleet_core::config::PositionConfig;
use airfleet_core::positioning::{pmtk, PositionFix, PositionProcessor};
use airfleet_core::traits::PositionSource;
use embedded_hal::digital::{self, OutputPin};
use embedded_io::{Read, ReadReady, Write};

/// Bytes moved from the UART per read
const CHUNK_LEN: usize = 64;

/// Stand-in for boards without the FORCE_ON line wired
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoForceOn;

impl digital::ErrorType for NoForceOn {
    type Error = Infallible;
}

impl OutputPin for NoForceOn {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

pub struct L86<U, P = NoForceOn> {
    uart: U,
    force_on: P,
    processor: PositionProcessor,
    fix_interval_ms: u32,
    /// Commands that could not be written
    command_failures: u32,
}

impl<U> L86<U, NoForceOn>
where
    U: Read + ReadReady + Write,
{
    pub fn new(uart: U, config: &PositionConfig) -> Self {
        Self::with_force_on(uart, NoForceOn, config)
    }
}

impl<U, P> L86<U, P>
where
    U: Read + ReadReady + Write,
    P: OutputPin,
{
    pub fn with_force_on(uart: U, force_on: P, config: &PositionConfig) -> Self {
        Self {
            uart,
            force_on,
            processor: PositionProcessor::new(config.distance),
            fix_interval_ms: config.fix_interval_ms,
            command_failures: 0,
        }
    }

    pub fn processor(&self) -> &PositionProcessor {
        &self.processor
    }

    pub fn command_failures(&self) -> u32 {
        self.command_failures
    }

    fn send(&mut self, command: Result<pmtk::Command, core::fmt::Error>) {
        let sent = match command {
            Ok(command) => self.uart.write_all(command.as_bytes()).is_ok(),
            Err(_) => false,
        };
        if !sent {
            self.command_failures = self.command_failures.wrapping_add(1);
        }
    }
}

impl<U, P> PositionSource for L86<U, P>
where
    U: Read + ReadReady + Write,
    P: OutputPin,
{
    fn on(&mut self) {
        let _ = self.force_on.set_high();
        self.send(pmtk::rmc_only());
        self.send(pmtk::set_fix_interval(self.fix_interval_ms));
    }

    fn off(&mut self) {
        self.send(pmtk::standby());
        let _ = self.force_on.set_low();
    }

    fn service(&mut self, now_ms: u32) {
        let mut chunk = [0u8; CHUNK_LEN];
        while let Ok(true) = self.uart.read_ready() {
            match self.uart.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => self.processor.feed_bytes(&chunk[..n], now_ms),
            }
        }
    }

    fn fix(&self) -> PositionFix {
        self.processor.fix()
    }

    fn reset_distance(&mut self) {
        self.processor.reset_distance();
    }
}
