//! Errors that can occur when using the BMP085 device.
//!
//! This module provides an error type that encapsulates all possible errors that can occur during
//! communication with the BMP085 and while compensating its readings.
//! It is generic over the error type of the underlying TWI controller.

use core::fmt;

/// A step of a bus transaction whose status code is checked.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Initial start condition.
    Start,
    /// Device address with the write bit.
    AddressWrite,
    /// Register address byte.
    Register,
    /// Control value written to the measurement control register.
    Control,
    /// Repeated start before switching to read mode.
    RepeatedStart,
    /// Device address with the read bit.
    AddressRead,
    /// First data byte, acknowledged by the master.
    DataMsb,
    /// Last data byte, not acknowledged by the master.
    DataLsb,
}

/// The controller reported `status` where `phase` expected something else.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhaseError {
    pub phase: Phase,
    pub status: u8,
}

impl PhaseError {
    /// Raw status code observed on the failing phase.
    pub fn status(&self) -> u8 {
        self.status
    }
}

impl fmt::Display for PhaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unexpected TWI status 0x{:02X} during {:?}", self.status, self.phase)
    }
}

/// This represents all possible errors that can occur when using the BMP085 device.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bmp085Error<BusError> {
    /// The TWI controller itself failed (e.g. a bounded wait expired)
    Bus(BusError),

    /// A transaction phase ended with an unexpected status code.
    ///
    /// The stop condition has already been issued when this is returned.
    Phase(PhaseError),

    /// A denominator of the compensation formulas evaluated to zero.
    ///
    /// Could indicate a corrupted calibration table or a garbage raw reading.
    DivideByZero,

    /// Temperature or pressure was requested before the data it depends on was available.
    ///
    /// Temperature needs a loaded calibration table; pressure additionally needs a prior
    /// successful temperature reading.
    UncalibratedRead,

    /// A calibration word read back as 0x0000 or 0xFFFF, which the device never stores.
    InvalidCalibration { index: usize, value: u16 },
}

/// A compensation formula would have divided by zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DivideByZero;

impl<BusError> From<DivideByZero> for Bmp085Error<BusError> {
    fn from(_: DivideByZero) -> Self {
        Bmp085Error::DivideByZero
    }
}

impl<BusError> From<PhaseError> for Bmp085Error<BusError> {
    fn from(error: PhaseError) -> Self {
        Bmp085Error::Phase(error)
    }
}

impl<BusError: fmt::Debug> fmt::Display for Bmp085Error<BusError> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bmp085Error::Bus(e) => write!(f, "TWI controller error: {:?}", e),
            Bmp085Error::Phase(e) => fmt::Display::fmt(e, f),
            Bmp085Error::DivideByZero => f.write_str("compensation denominator is zero"),
            Bmp085Error::UncalibratedRead => f.write_str("reading requested before calibration"),
            Bmp085Error::InvalidCalibration { index, value } => {
                write!(f, "calibration word {} holds invalid value 0x{:04X}", index, value)
            }
        }
    }
}

impl<BusError: fmt::Debug> core::error::Error for Bmp085Error<BusError> {}

/// Type alias used to simplify return types throughout the driver
pub type Bmp085Result<T, BusError> = Result<T, Bmp085Error<BusError>>;
