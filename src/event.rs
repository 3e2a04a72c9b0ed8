//! Observability hook.
//!
//! The driver reports what it does through an [`Observer`] instead of printing. Attach one with
//! [`Bmp085::with_observer`](crate::Bmp085::with_observer); a closure taking an [`Event`] works.

use crate::error::PhaseError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Calibration word `index` was read.
    CalibrationWord { index: usize, value: u16 },

    /// Reading calibration word `index` failed. `status` is `None` when the controller itself
    /// reported an error rather than an unexpected status code.
    CalibrationFailed { index: usize, status: Option<u8> },

    /// A temperature conversion was compensated.
    Temperature { raw: u16, b5: i32, decidegrees: i16 },

    /// A pressure conversion was compensated.
    Pressure { raw: u16, pascal: i32 },

    /// A conversion trigger or result read was aborted.
    TransactionFailed(PhaseError),
}

pub trait Observer {
    fn on_event(&mut self, event: Event);
}

/// Discards every event.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoObserver;

impl Observer for NoObserver {
    fn on_event(&mut self, _event: Event) {}
}

impl<F: FnMut(Event)> Observer for F {
    fn on_event(&mut self, event: Event) {
        self(event)
    }
}
