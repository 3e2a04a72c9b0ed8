//! Fixed addressing of the BMP085.
//!
//! The device answers on a single 8-bit bus address pair and exposes three things this driver
//! touches: the measurement control register, the conversion result pair and the factory
//! calibration block (11 big-endian words starting at 0xAA).

/// Bus address with the R/W bit cleared.
pub const DEVICE_ADDR_WRITE: u8 = 0xEE;

/// Bus address with the R/W bit set.
pub const DEVICE_ADDR_READ: u8 = 0xEF;

/// Writing a [`Command`] control value here starts a conversion.
pub const MEASUREMENT_CONTROL: u8 = 0xF4;

/// Number of 16-bit words in the calibration block.
pub const CALIBRATION_WORDS: usize = 11;

/// Address of the MSB of the first calibration word (AC1).
pub const CALIBRATION_BASE: u8 = 0xAA;

/// TWCR value written when the controller is initialized (TWEA | TWEN).
pub const TWI_CONTROL_INIT: u8 = 0x44;

/// TWBR bit-rate value for a 16 MHz ATmega328p.
pub const TWI_BITRATE_PRESCALER: u8 = 0x48;

/// MSB/LSB address pair of a 16-bit big-endian register.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterPair {
    pub msb: u8,
    pub lsb: u8,
}

/// Where a finished conversion (temperature or pressure) is latched.
pub const CONVERSION_RESULT: RegisterPair = RegisterPair::new(0xF6);

impl RegisterPair {
    /// A pair whose LSB lives at the address right after `msb`.
    pub const fn new(msb: u8) -> Self {
        Self { msb, lsb: msb.wrapping_add(1) }
    }

    /// Address pair of calibration word `index`, i.e. `(base + 2i, base + 2i + 1)`.
    ///
    /// Returns `None` for an index past the end of the block.
    pub const fn calibration(index: usize) -> Option<Self> {
        if index >= CALIBRATION_WORDS {
            return None;
        }

        Some(Self::new(CALIBRATION_BASE + 2 * index as u8))
    }

    /// Address pairs of the whole calibration block, in read order.
    pub fn calibration_block() -> impl Iterator<Item = Self> {
        (0..CALIBRATION_WORDS).filter_map(Self::calibration)
    }

    /// Both addresses packed as `msb << 8 | lsb`.
    pub const fn internal_address(&self) -> u16 {
        u16::from_be_bytes([self.msb, self.lsb])
    }
}

/// Control values accepted by [`MEASUREMENT_CONTROL`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Temperature,
    Pressure(Oversampling),
}

impl Command {
    pub const fn control_value(self) -> u8 {
        match self {
            Command::Temperature => 0x2E,
            Command::Pressure(oss) => 0x34 | (oss.bits() << 6),
        }
    }

    /// Worst-case conversion time in milliseconds, rounded up.
    pub const fn conversion_time_ms(self) -> u32 {
        match self {
            Command::Temperature => 5,
            Command::Pressure(oss) => oss.conversion_time_ms(),
        }
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> Self {
        command.control_value()
    }
}

/// Pressure oversampling setting (`oss` in the datasheet).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oversampling {
    #[default]
    UltraLowPower,
    Standard,
    HighResolution,
    UltraHighResolution,
}

/// An `oss` field value outside 0..=3.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UnexpectedValue(pub u8);

impl Oversampling {
    pub const fn bits(self) -> u8 {
        match self {
            Oversampling::UltraLowPower => 0b00,
            Oversampling::Standard => 0b01,
            Oversampling::HighResolution => 0b10,
            Oversampling::UltraHighResolution => 0b11,
        }
    }

    /// Datasheet maximum conversion times are 4.5, 7.5, 13.5 and 25.5 ms.
    pub const fn conversion_time_ms(self) -> u32 {
        match self {
            Oversampling::UltraLowPower => 5,
            Oversampling::Standard => 8,
            Oversampling::HighResolution => 14,
            Oversampling::UltraHighResolution => 26,
        }
    }
}

impl TryFrom<u8> for Oversampling {
    type Error = UnexpectedValue;

    fn try_from(field: u8) -> Result<Self, Self::Error> {
        match field {
            0b00 => Ok(Oversampling::UltraLowPower),
            0b01 => Ok(Oversampling::Standard),
            0b10 => Ok(Oversampling::HighResolution),
            0b11 => Ok(Oversampling::UltraHighResolution),
            other => Err(UnexpectedValue(other)),
        }
    }
}

impl From<Oversampling> for u8 {
    fn from(oss: Oversampling) -> Self {
        oss.bits()
    }
}
