//! AirFleet - Mobile Air Quality Sensor Firmware
//!
//! Main firmware binary for the RP2040-based sensor node. Samples the
//! particulate, climate and gas sensors plus GPS, drives the BLE character
//! display, and publishes telemetry through the cloud co-processor.

#![no_std]
#![no_main]

extern crate alloc;

use defmt::*;
use embassy_embedded_hal::shared_bus::blocking::i2c::I2cDevice;
use embassy_executor::Spawner;
use embassy_rp::adc::{self, Adc, Channel};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::{UART0, UART1};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Delay;
use embedded_alloc::LlffHeap as Heap;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use core::cell::RefCell;

use airfleet_core::config::Config;
use airfleet_core::orchestrator::Collaborators;
use airfleet_core::traits::Platform;
use airfleet_drivers::gps::L86;
use airfleet_drivers::sensor::{Htu31, Mics, Sen50};

use crate::board::{NodeOrchestrator, SensorBus};
use crate::bridge::{BridgeCloud, BridgeRadio};
use crate::platform::NodePlatform;

// Heap allocator for JSON parsing of cloud events
#[global_allocator]
static HEAP: Heap = Heap::empty();

// Heap size: 8KB
const HEAP_SIZE: usize = 8 * 1024;

/// Configuration validated and encoded by the build script from airfleet.toml
static CONFIG_BLOB: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/config.bin"));

/// L86 factory default baud rate
const GPS_BAUD: u32 = 9_600;

/// Co-processor link baud rate
const BRIDGE_BAUD: u32 = 115_200;

mod board;
mod bridge;
mod channels;
mod platform;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    UART1_IRQ => BufferedInterruptHandler<UART1>;
});

// Static cells for UART buffers (must live forever)
static GPS_TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static GPS_RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static BRIDGE_TX_BUF: StaticCell<[u8; 512]> = StaticCell::new();
static BRIDGE_RX_BUF: StaticCell<[u8; 512]> = StaticCell::new();

static SENSOR_BUS: StaticCell<SensorBus> = StaticCell::new();
static ORCHESTRATOR: StaticCell<NodeOrchestrator> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("AirFleet firmware starting...");

    // Initialize heap allocator
    init_heap();

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();
    info!(
        "Configuration loaded: sample every {} ms, publish every {} ms or {} km",
        config.sampling.interval_ms, config.publish.interval_ms, config.publish.distance_km
    );

    // Sensor I2C bus: SDA=GPIO16, SCL=GPIO17
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = 100_000;
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_17, p.PIN_16, i2c_config);
    let bus: &'static SensorBus = SENSOR_BUS.init(Mutex::new(RefCell::new(i2c)));

    info!("Sensor I2C bus initialized");

    // GPS UART: TX=GPIO0, RX=GPIO1, FORCE_ON=GPIO2
    let gps_uart = {
        let mut cfg = UartConfig::default();
        cfg.baudrate = GPS_BAUD;
        cfg
    };
    let gps_tx_buf = GPS_TX_BUF.init([0u8; 64]);
    let gps_rx_buf = GPS_RX_BUF.init([0u8; 256]);
    let gps_uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, gps_uart);
    let gps_uart = gps_uart.into_buffered::<UART0>(Irqs, gps_tx_buf, gps_rx_buf);
    let force_on = Output::new(p.PIN_2, Level::Low);

    info!("GPS UART initialized");

    // Co-processor UART: TX=GPIO8, RX=GPIO9
    let bridge_uart = {
        let mut cfg = UartConfig::default();
        cfg.baudrate = BRIDGE_BAUD;
        cfg
    };
    let bridge_tx_buf = BRIDGE_TX_BUF.init([0u8; 512]);
    let bridge_rx_buf = BRIDGE_RX_BUF.init([0u8; 512]);
    let bridge_uart = Uart::new_blocking(p.UART1, p.PIN_8, p.PIN_9, bridge_uart);
    let bridge_uart = bridge_uart.into_buffered::<UART1>(Irqs, bridge_tx_buf, bridge_rx_buf);
    let (bridge_tx, bridge_rx) = bridge_uart.split();

    info!("Bridge UART initialized");

    // Ignition sense on GPIO14, battery sense on GPIO26 (ADC0)
    let ignition = Input::new(p.PIN_14, Pull::Down);
    let adc = Adc::new_blocking(p.ADC, adc::Config::default());
    let battery = Channel::new_pin(p.PIN_26, Pull::None);
    let mut platform = NodePlatform::new(ignition, adc, battery);

    if let Some(volts) = platform.battery_voltage() {
        info!("Supply: {} V", volts);
    }

    let sample_interval_ms = config.sampling.interval_ms;
    let parts = Collaborators {
        particulate: Sen50::new(I2cDevice::new(bus), Delay),
        climate: Htu31::new(I2cDevice::new(bus), Delay),
        gas: Mics::new(I2cDevice::new(bus), Delay),
        position: L86::with_force_on(gps_uart, force_on, &config.position),
        cloud: BridgeCloud::default(),
        platform,
    };
    let orchestrator = ORCHESTRATOR.init(NodeOrchestrator::new(config, parts, BridgeRadio));

    // Spawn tasks
    spawner.spawn(tasks::bridge_rx_task(bridge_rx)).unwrap();
    spawner.spawn(tasks::bridge_tx_task(bridge_tx)).unwrap();
    spawner
        .spawn(tasks::sample_timer_task(sample_interval_ms))
        .unwrap();
    spawner.spawn(tasks::controller_task(orchestrator)).unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Initialize the heap allocator
fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    #[allow(static_mut_refs)]
    unsafe {
        HEAP.init(HEAP_MEM.as_ptr() as usize, HEAP_SIZE)
    }
}

/// Decode the embedded configuration
///
/// The build script has already validated it, so a decode failure means a
/// mismatched build; fall back to the built-in defaults.
fn load_config() -> Config {
    match Config::from_postcard(CONFIG_BLOB) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to decode embedded config: {:?}", e);
            error!("Using built-in defaults");
            Config::default()
        }
    }
}
