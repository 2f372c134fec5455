//! Concrete collaborator types for the sensor node board

use core::cell::RefCell;

use embassy_embedded_hal::shared_bus::blocking::i2c::I2cDevice;
use embassy_rp::gpio::Output;
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_rp::uart::BufferedUart;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Delay;

use airfleet_core::orchestrator::{Board, Orchestrator};
use airfleet_drivers::gps::L86;
use airfleet_drivers::sensor::{Htu31, Mics, Sen50};

use crate::bridge::{BridgeCloud, BridgeRadio};
use crate::platform::NodePlatform;

/// The sensor I2C bus, shared between the three bus sensors
pub type SensorBus = Mutex<NoopRawMutex, RefCell<I2c<'static, I2C0, i2c::Blocking>>>;

/// One sensor's handle on [`SensorBus`]
pub type BusDevice = I2cDevice<'static, NoopRawMutex, I2c<'static, I2C0, i2c::Blocking>>;

pub struct NodeBoard;

impl Board for NodeBoard {
    type Particulate = Sen50<BusDevice, Delay>;
    type Climate = Htu31<BusDevice, Delay>;
    type Gas = Mics<BusDevice, Delay>;
    type Position = L86<BufferedUart, Output<'static>>;
    type Radio = BridgeRadio;
    type Cloud = BridgeCloud;
    type Platform = NodePlatform;
}

pub type NodeOrchestrator = Orchestrator<NodeBoard>;
