//! BMP085 calibration coefficients and compensation functions.
//!
//! The factory calibration block holds 11 big-endian words (AC1..AC6, B1, B2, MB, MC, MD) at
//! 0xAA..=0xBF. The words are kept exactly as read; each formula reinterprets them as signed or
//! unsigned where it uses them, following the fixed-point algorithm published in the BMP085
//! datasheet.

use crate::error::{Bmp085Error, Bmp085Result, DivideByZero};
use crate::event::{Event, Observer};
use crate::register::{RegisterPair, CALIBRATION_WORDS};
use crate::twi::{read_register_pair, Twi};

pub const AC1: usize = 0;
pub const AC2: usize = 1;
pub const AC3: usize = 2;
pub const AC4: usize = 3;
pub const AC5: usize = 4;
pub const AC6: usize = 5;
pub const B1: usize = 6;
pub const B2: usize = 7;
pub const MB: usize = 8;
pub const MC: usize = 9;
pub const MD: usize = 10;

/// The 11 raw calibration words, in device order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationTable {
    words: [u16; CALIBRATION_WORDS],
}

/// Result of a temperature compensation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CompensatedTemperature {
    /// Temperature in 0.1 °C.
    pub decidegrees: i16,
    /// Intermediate term the pressure formula depends on.
    pub b5: i32,
}

impl CalibrationTable {
    pub const fn from_words(words: [u16; CALIBRATION_WORDS]) -> Self {
        Self { words }
    }

    /// Reads all 11 calibration words from the device.
    ///
    /// A failing read does not stop the remaining ones; every outcome is reported to `observer`
    /// and the first failure is returned once the block has been walked. A table where any word
    /// is 0x0000 or 0xFFFF is rejected with [`Bmp085Error::InvalidCalibration`].
    pub fn load<T: Twi, O: Observer>(twi: &mut T, observer: &mut O) -> Bmp085Result<Self, T::Error> {
        let mut words = [0u16; CALIBRATION_WORDS];
        let mut first_error = None;

        for (index, (word, pair)) in words.iter_mut().zip(RegisterPair::calibration_block()).enumerate() {
            match read_register_pair(twi, pair.msb, pair.internal_address()) {
                Ok(value) => {
                    trace!("calibration word {} = {:#x}", index, value);
                    *word = value;
                    observer.on_event(Event::CalibrationWord { index, value });
                }
                Err(e) => {
                    let status = match &e {
                        Bmp085Error::Phase(p) => Some(p.status),
                        _ => None,
                    };
                    warn!("calibration word {} could not be read", index);
                    observer.on_event(Event::CalibrationFailed { index, status });
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        let table = Self { words };
        table.validate()?;

        Ok(table)
    }

    /// Rejects the 0x0000 / 0xFFFF words a failed read leaves behind.
    pub fn validate<E>(&self) -> Bmp085Result<(), E> {
        match self.words.iter().position(|w| *w == 0x0000 || *w == 0xFFFF) {
            Some(index) => Err(Bmp085Error::InvalidCalibration { index, value: self.words[index] }),
            None => Ok(()),
        }
    }

    pub fn words(&self) -> &[u16; CALIBRATION_WORDS] {
        &self.words
    }

    fn signed(&self, index: usize) -> i32 {
        self.words[index] as i16 as i32
    }

    fn unsigned(&self, index: usize) -> i32 {
        self.words[index] as i32
    }

    /// Converts an uncompensated temperature reading.
    pub fn compensate_temperature(&self, raw: u16) -> Result<CompensatedTemperature, DivideByZero> {
        let ac5 = self.unsigned(AC5);
        let ac6 = self.unsigned(AC6);
        let mc = self.signed(MC);
        let md = self.signed(MD);

        let x1 = (raw as i32 - ac6).wrapping_mul(ac5) >> 15;
        let denominator = x1 + md;
        if denominator == 0 {
            return Err(DivideByZero);
        }
        let x2 = (mc << 11) / denominator;
        let b5 = x1 + x2;

        // Narrowing keeps the low 16 bits, like the reference int16 result. Only a corrupt table
        // pushes b5 far enough for that to matter.
        Ok(CompensatedTemperature {
            decidegrees: ((b5 + 8) >> 4) as i16,
            b5,
        })
    }

    /// Converts an uncompensated pressure reading (oss = 0) to Pa.
    ///
    /// `b5` must come from a temperature compensation taken under the same conditions.
    pub fn compensate_pressure(&self, raw: u16, b5: i32) -> Result<i32, DivideByZero> {
        let ac1 = self.signed(AC1);
        let ac2 = self.signed(AC2);
        let ac3 = self.signed(AC3);
        let ac4 = self.words[AC4] as u32;
        let b1 = self.signed(B1);
        let b2 = self.signed(B2);

        let b6 = b5.wrapping_sub(4000);
        let b6_sq = b6.wrapping_mul(b6) >> 12;

        let x1 = b2.wrapping_mul(b6_sq) >> 11;
        let x2 = ac2.wrapping_mul(b6) >> 11;
        let x3 = x1.wrapping_add(x2);
        // The + 2 rounds to nearest before the divide by 4, as in the datasheet.
        let b3 = (ac1 * 4).wrapping_add(x3).wrapping_add(2) >> 2;

        let x1 = ac3.wrapping_mul(b6) >> 13;
        let x2 = b1.wrapping_mul(b6_sq) >> 16;
        let x3 = x1.wrapping_add(x2).wrapping_add(2) >> 2;
        let b4 = ac4.wrapping_mul(x3.wrapping_add(32768) as u32) >> 15;
        if b4 == 0 {
            return Err(DivideByZero);
        }

        let b7 = (raw as u32).wrapping_sub(b3 as u32).wrapping_mul(50000);
        let mut p = if b7 < 0x8000_0000 {
            ((b7 << 1) / b4) as i32
        } else {
            ((b7 / b4) << 1) as i32
        };

        let x1 = (p >> 8).wrapping_mul(p >> 8);
        let x1 = x1.wrapping_mul(3038) >> 16;
        let x2 = p.wrapping_mul(-7357) >> 16;
        p = p.wrapping_add(x1.wrapping_add(x2).wrapping_add(3791) >> 4);

        Ok(p)
    }
}
