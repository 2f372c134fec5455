//! Bus sensor capability

/// Errors that can occur while sampling a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Bus transaction failed
    Bus,
    /// CRC mismatch in the sensor reply
    Checksum,
    /// Reply decoded but the values are not plausible
    InvalidReading,
    /// Sensor has not been switched on
    NotPowered,
}

/// Particulate mass concentrations in µg/m³
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParticulateReading {
    pub pm1: f32,
    pub pm25: f32,
    pub pm4: f32,
    pub pm10: f32,
}

impl ParticulateReading {
    pub fn as_array(&self) -> [f32; 4] {
        [self.pm1, self.pm25, self.pm4, self.pm10]
    }

    /// Largest of the four fractions
    pub fn max(&self) -> f32 {
        self.as_array().into_iter().fold(0.0, f32::max)
    }
}

/// Temperature (°C) and relative humidity (%)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClimateReading {
    pub temperature: f32,
    pub humidity: f32,
}

/// VOC (ppb) and equivalent CO2 (ppm)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GasReading {
    pub voc: u16,
    pub co2: u16,
}

/// Uniform contract for one sensor kind
///
/// `service` is called every idle tick and may start a measurement;
/// `sample` collects the result. Neither may block for longer than the
/// sensor's own conversion time.
pub trait Sensor {
    type Reading: Copy + PartialEq;

    fn on(&mut self) -> Result<(), SensorError>;

    fn off(&mut self) -> Result<(), SensorError>;

    fn service(&mut self, now_ms: u32);

    fn sample(&mut self, now_ms: u32) -> Result<Self::Reading, SensorError>;
}
