//! Blocking `no_std` driver for the Bosch BMP085 barometric pressure sensor.
//!
//! The driver talks to the sensor through the byte-level [`Twi`](twi::Twi) trait of an
//! AVR-style two-wire controller, checking the controller status after every phase of a
//! transaction. Raw conversions are turned into 0.1 °C and Pa with the integer compensation
//! algorithm from the datasheet.
//!
//! Pressure compensation depends on the last temperature reading, so read temperature first or
//! use [`Bmp085::read_measurement`].
#![no_std]

mod fmt;

pub mod calibration;
pub mod config;
pub mod error;
pub mod event;
pub mod register;
pub mod twi;
mod bmp085;

#[cfg(test)]
mod testing;

pub use bmp085::{Bmp085, Measurement};
pub use calibration::{CalibrationTable, CompensatedTemperature};
pub use error::{Bmp085Error, Bmp085Result};
pub use event::{Event, NoObserver, Observer};
