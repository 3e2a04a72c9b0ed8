use crate::register::{Command, Oversampling, TWI_BITRATE_PRESCALER, TWI_CONTROL_INIT};

/// Driver configuration.
///
/// The defaults match an ATmega328p at 16 MHz talking to a BMP085 in ultra low power mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Configuration {
    pub(crate) twi_control: u8,
    pub(crate) bitrate_prescaler: u8,
    pub(crate) temperature_delay_ms: u32,
    pub(crate) pressure_delay_ms: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            twi_control: TWI_CONTROL_INIT,
            bitrate_prescaler: TWI_BITRATE_PRESCALER,
            temperature_delay_ms: Command::Temperature.conversion_time_ms(),
            pressure_delay_ms: Command::Pressure(Oversampling::UltraLowPower).conversion_time_ms(),
        }
    }
}

impl Configuration {
    /// Control value handed to [`Twi::init`](crate::twi::Twi::init).
    pub fn twi_control(mut self, control: u8) -> Self {
        self.twi_control = control;

        self
    }

    /// Bit-rate value handed to [`Twi::init`](crate::twi::Twi::init).
    /// The right value depends on the CPU clock.
    pub fn bitrate_prescaler(mut self, prescaler: u8) -> Self {
        self.bitrate_prescaler = prescaler;

        self
    }

    /// Wait between triggering a temperature conversion and reading it back.
    ///
    /// Shorter than 5 ms reads a stale or half-finished result.
    pub fn temperature_delay_ms(mut self, ms: u32) -> Self {
        self.temperature_delay_ms = ms;

        self
    }

    pub fn pressure_delay_ms(mut self, ms: u32) -> Self {
        self.pressure_delay_ms = ms;

        self
    }
}
