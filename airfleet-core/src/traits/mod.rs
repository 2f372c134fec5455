//! Collaborator traits
//!
//! These traits define the interface between the orchestration logic and
//! the hardware-specific implementations: bus sensors, the GPS receiver,
//! the display radio, the cloud transport and the board itself.

pub mod cloud;
pub mod platform;
pub mod position;
pub mod radio;
pub mod sensor;

pub use cloud::{CloudError, CloudEvent, CloudTransport};
pub use platform::Platform;
pub use position::PositionSource;
pub use radio::{ChannelHandle, LinkRadio, RadioError, RadioEvent};
pub use sensor::{ClimateReading, GasReading, ParticulateReading, Sensor, SensorError};
