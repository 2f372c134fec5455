//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in airfleet-core for the sensor node's peripherals:
//!
//! - Particulate sensor (Sensirion SEN50)
//! - Temperature and humidity sensor (TE HTU31D)
//! - VOC and CO2 sensor (SGX MiCS-VZ-89TE)
//! - GPS receiver (Quectel L86)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod gps;
pub mod sensor;
