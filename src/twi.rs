use crate::error::{Bmp085Error, Bmp085Result, Phase, PhaseError};
use crate::register::{DEVICE_ADDR_READ, DEVICE_ADDR_WRITE, MEASUREMENT_CONTROL};

/// Status codes reported by an AVR-style TWI controller (TWSR with the prescaler bits masked).
pub mod status {
    pub const START: u8 = 0x08;
    pub const REPEATED_START: u8 = 0x10;
    pub const MT_SLA_W_ACK: u8 = 0x18;
    pub const MT_DATA_W_ACK: u8 = 0x28;
    pub const MR_SLA_R_ACK: u8 = 0x40;
    pub const MR_DATA_R_ACK: u8 = 0x50;
    pub const MR_DATA_R_NACK: u8 = 0x58;

    /// TWSR bits 0..=2 hold the prescaler, not the status.
    pub const MASK: u8 = 0xF8;
}

/// Byte-level access to a two-wire bus master.
///
/// Every primitive blocks until the controller has finished, after which [`Twi::status`]
/// reports the outcome. An implementation may bound its waits and report an expired wait
/// through `Self::Error`.
pub trait Twi {
    type Error;

    /// Configures the controller with a TWCR control value and a TWBR bit-rate value.
    fn init(&mut self, control: u8, bitrate: u8) -> Result<(), Self::Error>;

    /// Issues a start condition, or a repeated start while the bus is already held.
    fn start(&mut self) -> Result<(), Self::Error>;

    fn stop(&mut self) -> Result<(), Self::Error>;

    fn send_byte(&mut self, byte: u8) -> Result<(), Self::Error>;

    fn read_byte(&mut self) -> Result<u8, Self::Error>;

    fn status(&mut self) -> Result<u8, Self::Error>;

    /// Stops acknowledging received bytes so the next one is answered with NACK.
    fn disable_ack(&mut self) -> Result<(), Self::Error>;
}

impl<T: Twi + ?Sized> Twi for &mut T {
    type Error = T::Error;

    fn init(&mut self, control: u8, bitrate: u8) -> Result<(), Self::Error> {
        T::init(self, control, bitrate)
    }

    fn start(&mut self) -> Result<(), Self::Error> {
        T::start(self)
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        T::stop(self)
    }

    fn send_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        T::send_byte(self, byte)
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        T::read_byte(self)
    }

    fn status(&mut self) -> Result<u8, Self::Error> {
        T::status(self)
    }

    fn disable_ack(&mut self) -> Result<(), Self::Error> {
        T::disable_ack(self)
    }
}

/// One framed transaction on the bus.
///
/// The stop condition is issued exactly once: by [`Transaction::finish`] on success, or on drop
/// when a phase bailed out early with `?`.
struct Transaction<'a, T: Twi> {
    twi: &'a mut T,
    stopped: bool,
}

impl<'a, T: Twi> Transaction<'a, T> {
    fn new(twi: &'a mut T) -> Self {
        Self { twi, stopped: false }
    }

    fn expect(&mut self, phase: Phase, accepted: &[u8]) -> Bmp085Result<(), T::Error> {
        let status = self.twi.status().map_err(Bmp085Error::Bus)? & status::MASK;
        if accepted.contains(&status) {
            return Ok(());
        }

        warn!("TWI phase {:?} failed with status {:#x}", phase, status);
        Err(PhaseError { phase, status }.into())
    }

    fn start(&mut self, phase: Phase, accepted: &[u8]) -> Bmp085Result<(), T::Error> {
        self.twi.start().map_err(Bmp085Error::Bus)?;
        self.expect(phase, accepted)
    }

    fn send(&mut self, phase: Phase, byte: u8, accepted: u8) -> Bmp085Result<(), T::Error> {
        self.twi.send_byte(byte).map_err(Bmp085Error::Bus)?;
        self.expect(phase, &[accepted])
    }

    /// Clocks out `pointer` and reads the byte the device answers with.
    fn exchange(&mut self, phase: Phase, pointer: u8, accepted: u8) -> Bmp085Result<u8, T::Error> {
        self.twi.send_byte(pointer).map_err(Bmp085Error::Bus)?;
        let byte = self.twi.read_byte().map_err(Bmp085Error::Bus)?;
        self.expect(phase, &[accepted])?;

        Ok(byte)
    }

    fn finish(mut self) -> Bmp085Result<(), T::Error> {
        self.stopped = true;
        self.twi.stop().map_err(Bmp085Error::Bus)
    }
}

impl<T: Twi> Drop for Transaction<'_, T> {
    fn drop(&mut self) {
        if !self.stopped {
            // The phase error is what the caller needs to see; a failing stop cannot be reported.
            let _ = self.twi.stop();
        }
    }
}

/// Starts a conversion by writing `control` to the measurement control register.
///
/// The caller must wait for the conversion time of the selected mode before reading the result.
pub fn trigger_conversion<T: Twi>(twi: &mut T, control: u8) -> Bmp085Result<(), T::Error> {
    let mut tx = Transaction::new(twi);

    tx.start(Phase::Start, &[status::START, status::REPEATED_START])?;
    tx.send(Phase::AddressWrite, DEVICE_ADDR_WRITE, status::MT_SLA_W_ACK)?;
    tx.send(Phase::Register, MEASUREMENT_CONTROL, status::MT_DATA_W_ACK)?;
    tx.send(Phase::Control, control, status::MT_DATA_W_ACK)?;

    tx.finish()
}

/// Reads a 16-bit big-endian value.
///
/// `read_register` is the address written before the repeated start and `internal_address`
/// packs the MSB/LSB register addresses the device pointer is driven through while reading.
/// The first byte received becomes the high byte of the result.
pub fn read_register_pair<T: Twi>(
    twi: &mut T,
    read_register: u8,
    internal_address: u16,
) -> Bmp085Result<u16, T::Error> {
    let [pointer_msb, pointer_lsb] = internal_address.to_be_bytes();
    let mut tx = Transaction::new(twi);

    tx.start(Phase::Start, &[status::START])?;
    tx.send(Phase::AddressWrite, DEVICE_ADDR_WRITE, status::MT_SLA_W_ACK)?;
    tx.send(Phase::Register, read_register, status::MT_DATA_W_ACK)?;
    tx.start(Phase::RepeatedStart, &[status::REPEATED_START])?;
    tx.send(Phase::AddressRead, DEVICE_ADDR_READ, status::MR_SLA_R_ACK)?;

    let msb = tx.exchange(Phase::DataMsb, pointer_msb, status::MR_DATA_R_ACK)?;
    tx.twi.disable_ack().map_err(Bmp085Error::Bus)?;
    let lsb = tx.exchange(Phase::DataLsb, pointer_lsb, status::MR_DATA_R_NACK)?;

    tx.finish()?;

    Ok(u16::from_be_bytes([msb, lsb]))
}
