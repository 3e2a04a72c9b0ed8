use crate::calibration::CalibrationTable;
use crate::config::Configuration;
use crate::error::{Bmp085Error, Bmp085Result};
use crate::event::{Event, NoObserver, Observer};
use crate::register::{Command, Oversampling, CONVERSION_RESULT};
use crate::twi::{read_register_pair, trigger_conversion, Twi};
use embedded_hal::delay::DelayNs;

/// Main Bmp085 driver struct
///
/// Owns the TWI controller, the delay provider, the calibration table once it has been loaded
/// and the `b5` term of the last temperature reading, which pressure compensation depends on.
pub struct Bmp085<T, D, O = NoObserver> {
    twi: T,
    delay: D,
    config: Configuration,
    calibration: Option<CalibrationTable>,
    b5: Option<i32>,
    observer: O,
}

impl<T, D> Bmp085<T, D>
where
    T: Twi,
    D: DelayNs,
{
    /// Constructs a new driver and initializes the TWI controller.
    ///
    /// The calibration table still has to be loaded with [`load_calibration`](Self::load_calibration)
    /// before any reading.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use embedded_hal::delay::DelayNs;
    /// # use bmp085_rs::twi::Twi;
    /// # use bmp085_rs::Bmp085Result;
    ///  use bmp085_rs::Bmp085;
    ///  use bmp085_rs::config::Configuration;
    /// # fn demo<T: Twi, D: DelayNs>(twi: T, delay: D) -> Bmp085Result<(), T::Error> {
    ///  let mut device = Bmp085::new(twi, delay, Configuration::default())?;
    ///  device.load_calibration()?;
    ///
    ///  let decidegrees = device.read_temperature()?;
    ///  let pascal = device.read_pressure()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(twi: T, delay: D, config: Configuration) -> Bmp085Result<Self, T::Error> {
        let mut device = Bmp085 {
            twi,
            delay,
            config,
            calibration: None,
            b5: None,
            observer: NoObserver,
        };
        device.init()?;

        Ok(device)
    }
}

impl<T, D, O> Bmp085<T, D, O>
where
    T: Twi,
    D: DelayNs,
    O: Observer,
{
    /// Replaces the observer that receives driver [`Event`]s.
    pub fn with_observer<O2: Observer>(self, observer: O2) -> Bmp085<T, D, O2> {
        Bmp085 {
            twi: self.twi,
            delay: self.delay,
            config: self.config,
            calibration: self.calibration,
            b5: self.b5,
            observer,
        }
    }

    /// (Re)initializes the TWI controller and forgets calibration and the cached `b5`.
    pub fn init(&mut self) -> Bmp085Result<(), T::Error> {
        self.calibration = None;
        self.b5 = None;

        debug!(
            "TWI init: control {:#x}, bitrate {:#x}",
            self.config.twi_control,
            self.config.bitrate_prescaler
        );
        self.twi
            .init(self.config.twi_control, self.config.bitrate_prescaler)
            .map_err(Bmp085Error::Bus)
    }

    /// Reads the factory calibration block.
    ///
    /// On failure the driver is left uncalibrated and readings return
    /// [`Bmp085Error::UncalibratedRead`] until a load succeeds.
    pub fn load_calibration(&mut self) -> Bmp085Result<&CalibrationTable, T::Error> {
        self.calibration = None;
        self.b5 = None;

        let table = CalibrationTable::load(&mut self.twi, &mut self.observer)?;
        debug!("calibration loaded");

        Ok(self.calibration.insert(table))
    }

    pub fn calibration(&self) -> Option<&CalibrationTable> {
        self.calibration.as_ref()
    }

    /// Measures the temperature in 0.1 °C.
    ///
    /// Also refreshes the `b5` term used by [`read_pressure`](Self::read_pressure). A failed
    /// reading clears it.
    pub fn read_temperature(&mut self) -> Bmp085Result<i16, T::Error> {
        let calibration = self.calibration.ok_or(Bmp085Error::UncalibratedRead)?;
        self.b5 = None;

        let raw = self.convert(Command::Temperature, self.config.temperature_delay_ms)?;
        let temperature = calibration.compensate_temperature(raw)?;
        self.b5 = Some(temperature.b5);

        trace!("temperature raw {} -> {} dC", raw, temperature.decidegrees);
        self.observer.on_event(Event::Temperature {
            raw,
            b5: temperature.b5,
            decidegrees: temperature.decidegrees,
        });

        Ok(temperature.decidegrees)
    }

    /// Measures the pressure in Pa.
    ///
    /// Compensation uses the `b5` term of the last temperature reading, so
    /// [`read_temperature`](Self::read_temperature) must have succeeded first.
    pub fn read_pressure(&mut self) -> Bmp085Result<i32, T::Error> {
        let calibration = self.calibration.ok_or(Bmp085Error::UncalibratedRead)?;
        let b5 = self.b5.ok_or(Bmp085Error::UncalibratedRead)?;

        let raw = self.convert(
            Command::Pressure(Oversampling::UltraLowPower),
            self.config.pressure_delay_ms,
        )?;
        let pascal = calibration.compensate_pressure(raw, b5)?;

        trace!("pressure raw {} -> {} Pa", raw, pascal);
        self.observer.on_event(Event::Pressure { raw, pascal });

        Ok(pascal)
    }

    /// Reads temperature and then pressure, so the pressure is compensated with a fresh `b5`.
    pub fn read_measurement(&mut self) -> Bmp085Result<Measurement, T::Error> {
        let temperature = self.read_temperature()?;
        let pressure = self.read_pressure()?;

        Ok(Measurement { temperature, pressure })
    }

    /// Consumes the driver and hands back the TWI controller and the delay provider.
    pub fn release(self) -> (T, D) {
        (self.twi, self.delay)
    }

    /// Triggers a conversion, waits `delay_ms` and reads the raw result.
    fn convert(&mut self, command: Command, delay_ms: u32) -> Bmp085Result<u16, T::Error> {
        let raw = trigger_conversion(&mut self.twi, command.control_value()).and_then(|_| {
            self.delay.delay_ms(delay_ms);
            read_register_pair(&mut self.twi, CONVERSION_RESULT.msb, CONVERSION_RESULT.internal_address())
        });

        if let Err(Bmp085Error::Phase(e)) = &raw {
            self.observer.on_event(Event::TransactionFailed(*e));
        }

        raw
    }
}

/// A compensated temperature and pressure pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Temperature in 0.1 °C.
    pub temperature: i16,
    /// Pressure in Pa.
    pub pressure: i32,
}

impl Measurement {
    pub fn temperature_celsius(&self) -> f32 {
        self.temperature as f32 / 10.0
    }

    pub fn pressure_pascal(&self) -> i32 {
        self.pressure
    }

    pub fn pressure_hectopascal(&self) -> f32 {
        self.pressure as f32 / 100.0
    }
}

#[cfg(feature = "uom")]
impl Measurement {
    pub fn temperature_uom(&self) -> uom::si::f32::ThermodynamicTemperature {
        use uom::si::thermodynamic_temperature::degree_celsius;
        uom::si::f32::ThermodynamicTemperature::new::<degree_celsius>(self.temperature_celsius())
    }

    pub fn pressure_uom(&self) -> uom::si::f32::Pressure {
        use uom::si::pressure::pascal;
        uom::si::f32::Pressure::new::<pascal>(self.pressure as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Phase, PhaseError};
    use crate::testing::{Call, FakeDelay, FakeTwi, DATASHEET_CALIBRATION, DATASHEET_UP, DATASHEET_UT};
    use heapless::Vec;

    fn calibrated(twi: FakeTwi) -> Bmp085<FakeTwi, FakeDelay> {
        let mut device = Bmp085::new(twi, FakeDelay::default(), Configuration::default()).unwrap();
        device.load_calibration().unwrap();
        device
    }

    fn datasheet_twi() -> FakeTwi {
        let mut twi = FakeTwi::new();
        twi.script_calibration(&DATASHEET_CALIBRATION);
        twi
    }

    #[test]
    fn new_initializes_controller() {
        let device = Bmp085::new(FakeTwi::new(), FakeDelay::default(), Configuration::default()).unwrap();
        let (twi, _) = device.release();

        assert_eq!(&[Call::Init(0x44, 0x48)], twi.calls());
    }

    #[test]
    fn bmp085_read_sensor_data() {
        let mut twi = datasheet_twi();
        twi.script_conversion(DATASHEET_UT);
        twi.script_conversion(DATASHEET_UP);
        let mut device = calibrated(twi);

        let measurement = device.read_measurement().unwrap();

        assert_eq!(Measurement { temperature: 150, pressure: 69964 }, measurement);
        assert_eq!(15.0, measurement.temperature_celsius());
    }

    #[test]
    fn temperature_waits_for_conversion() {
        let mut twi = datasheet_twi();
        twi.script_conversion(DATASHEET_UT);
        let mut device = calibrated(twi);

        assert_eq!(Ok(150), device.read_temperature());

        let (twi, delay) = device.release();
        assert_eq!(5_000_000, delay.waited_ns);
        assert!(twi.calls().contains(&Call::Send(0x2E)));
    }

    #[test]
    fn pressure_uses_ultra_low_power_control() {
        let mut twi = datasheet_twi();
        twi.script_conversion(DATASHEET_UT);
        twi.script_conversion(DATASHEET_UP);
        let mut device = calibrated(twi);

        device.read_temperature().unwrap();
        assert_eq!(Ok(69964), device.read_pressure());

        let (twi, _) = device.release();
        assert!(twi.calls().contains(&Call::Send(0x34)));
    }

    #[test]
    fn temperature_before_calibration() {
        let mut device = Bmp085::new(FakeTwi::new(), FakeDelay::default(), Configuration::default()).unwrap();

        assert_eq!(Err(Bmp085Error::UncalibratedRead), device.read_temperature());

        // No bus traffic besides init.
        let (twi, _) = device.release();
        assert_eq!(1, twi.calls().len());
    }

    #[test]
    fn pressure_before_temperature() {
        let mut device = calibrated(datasheet_twi());

        assert_eq!(Err(Bmp085Error::UncalibratedRead), device.read_pressure());
    }

    #[test]
    fn failed_temperature_forgets_b5() {
        let mut twi = datasheet_twi();
        twi.script_conversion(DATASHEET_UT);
        twi.with_statuses(&[0x38]);
        let mut device = calibrated(twi);

        device.read_temperature().unwrap();
        let err = device.read_temperature().unwrap_err();

        assert_eq!(Bmp085Error::Phase(PhaseError { phase: Phase::Start, status: 0x38 }), err);
        assert_eq!(Err(Bmp085Error::UncalibratedRead), device.read_pressure());
    }

    #[test]
    fn failed_trigger_skips_delay_and_read() {
        let mut twi = datasheet_twi();
        twi.with_statuses(&[0x08, 0x20]);
        let mut device = calibrated(twi);

        assert!(device.read_temperature().is_err());

        let (twi, delay) = device.release();
        assert_eq!(0, delay.waited_ns);
        assert_eq!(Some(&Call::Stop), twi.calls().last());
    }

    #[test]
    fn failed_calibration_leaves_driver_uncalibrated() {
        let mut twi = FakeTwi::new();
        twi.script_calibration(&[0u16; 11]);
        let mut device = Bmp085::new(twi, FakeDelay::default(), Configuration::default()).unwrap();

        assert_eq!(
            Err(Bmp085Error::InvalidCalibration { index: 0, value: 0 }),
            device.load_calibration().map(|t| *t)
        );
        assert!(device.calibration().is_none());
        assert_eq!(Err(Bmp085Error::UncalibratedRead), device.read_temperature());
    }

    #[test]
    fn degenerate_reading_divides_by_zero() {
        let mut twi = datasheet_twi();
        // AC6 - 2868 makes x1 == -MD.
        twi.script_conversion(20285);
        let mut device = calibrated(twi);

        assert_eq!(Err(Bmp085Error::DivideByZero), device.read_temperature());
        assert_eq!(Err(Bmp085Error::UncalibratedRead), device.read_pressure());
    }

    #[test]
    fn observer_sees_every_step() {
        let mut twi = datasheet_twi();
        twi.script_conversion(DATASHEET_UT);
        twi.script_conversion(DATASHEET_UP);

        let mut events: Vec<Event, 16> = Vec::new();
        {
            let mut device = Bmp085::new(twi, FakeDelay::default(), Configuration::default())
                .unwrap()
                .with_observer(|e: Event| events.push(e).unwrap());
            device.load_calibration().unwrap();
            device.read_measurement().unwrap();
        }

        assert_eq!(13, events.len());
        assert_eq!(Event::CalibrationWord { index: 0, value: 408 }, events[0]);
        assert_eq!(Event::Temperature { raw: DATASHEET_UT, b5: 2400, decidegrees: 150 }, events[11]);
        assert_eq!(Event::Pressure { raw: DATASHEET_UP, pascal: 69964 }, events[12]);
    }

    #[test]
    fn observer_sees_failed_transaction() {
        let mut twi = datasheet_twi();
        twi.with_statuses(&[0x08, 0x20]);

        let mut events: Vec<Event, 16> = Vec::new();
        {
            let mut device = Bmp085::new(twi, FakeDelay::default(), Configuration::default())
                .unwrap()
                .with_observer(|e: Event| events.push(e).unwrap());
            device.load_calibration().unwrap();
            assert!(device.read_temperature().is_err());
        }

        assert_eq!(
            Some(&Event::TransactionFailed(PhaseError { phase: Phase::AddressWrite, status: 0x20 })),
            events.last()
        );
    }

    #[test]
    fn reload_produces_identical_table() {
        let mut twi = datasheet_twi();
        twi.script_calibration(&DATASHEET_CALIBRATION);
        let mut device = calibrated(twi);
        let first = *device.calibration().unwrap();

        let second = *device.load_calibration().unwrap();

        assert_eq!(first, second);
    }
}
