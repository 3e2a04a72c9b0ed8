use crate::twi::{status, Twi};
use embedded_hal::delay::DelayNs;
use heapless::{Deque, Vec};

/// A primitive invoked on [`FakeTwi`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Init(u8, u8),
    Start,
    Stop,
    Send(u8),
    Read,
    Status,
    DisableAck,
}

/// Scripted TWI controller.
///
/// Status codes and received bytes are handed out in the order they were queued. Asking for a
/// status or byte once the script is exhausted fails with `Err(())`, like a controller that
/// never finishes.
pub struct FakeTwi {
    statuses: Deque<u8, 256>,
    bytes: Deque<u8, 64>,
    calls: Vec<Call, 512>,
}

impl FakeTwi {
    pub fn new() -> Self {
        FakeTwi {
            statuses: Deque::new(),
            bytes: Deque::new(),
            calls: Vec::new(),
        }
    }

    pub fn with_statuses(&mut self, statuses: &[u8]) {
        for s in statuses {
            self.statuses.push_back(*s).unwrap();
        }
    }

    pub fn with_bytes(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.bytes.push_back(*b).unwrap();
        }
    }

    /// Queues a clean conversion trigger.
    pub fn script_trigger(&mut self) {
        self.with_statuses(&[
            status::START,
            status::MT_SLA_W_ACK,
            status::MT_DATA_W_ACK,
            status::MT_DATA_W_ACK,
        ]);
    }

    /// Queues a clean register pair read returning `msb`, `lsb`.
    pub fn script_read(&mut self, msb: u8, lsb: u8) {
        self.with_statuses(&[
            status::START,
            status::MT_SLA_W_ACK,
            status::MT_DATA_W_ACK,
            status::REPEATED_START,
            status::MR_SLA_R_ACK,
            status::MR_DATA_R_ACK,
            status::MR_DATA_R_NACK,
        ]);
        self.with_bytes(&[msb, lsb]);
    }

    /// Queues a read whose address phase is not acknowledged.
    pub fn script_failed_read(&mut self, status: u8) {
        self.with_statuses(&[crate::twi::status::START, status]);
    }

    /// Queues the 11 calibration reads of `words`.
    pub fn script_calibration(&mut self, words: &[u16; 11]) {
        for w in words {
            let [msb, lsb] = w.to_be_bytes();
            self.script_read(msb, lsb);
        }
    }

    /// Queues a trigger followed by a result read of `raw`.
    pub fn script_conversion(&mut self, raw: u16) {
        self.script_trigger();
        let [msb, lsb] = raw.to_be_bytes();
        self.script_read(msb, lsb);
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    fn record(&mut self, call: Call) {
        self.calls.push(call).unwrap();
    }
}

impl Twi for FakeTwi {
    type Error = ();

    fn init(&mut self, control: u8, bitrate: u8) -> Result<(), Self::Error> {
        self.record(Call::Init(control, bitrate));
        Ok(())
    }

    fn start(&mut self) -> Result<(), Self::Error> {
        self.record(Call::Start);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        self.record(Call::Stop);
        Ok(())
    }

    fn send_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.record(Call::Send(byte));
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        self.record(Call::Read);
        self.bytes.pop_front().ok_or(())
    }

    fn status(&mut self) -> Result<u8, Self::Error> {
        self.record(Call::Status);
        self.statuses.pop_front().ok_or(())
    }

    fn disable_ack(&mut self) -> Result<(), Self::Error> {
        self.record(Call::DisableAck);
        Ok(())
    }
}

/// Delay that returns immediately and remembers how long it was asked to wait.
#[derive(Default)]
pub struct FakeDelay {
    pub waited_ns: u64,
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waited_ns += u64::from(ns);
    }
}

/// Datasheet worked example calibration: AC1..AC6, B1, B2, MB, MC, MD.
pub const DATASHEET_CALIBRATION: [u16; 11] = [
    408,
    -72i16 as u16,
    -14383i16 as u16,
    32741,
    32757,
    23153,
    6190,
    4,
    -32768i16 as u16,
    -8711i16 as u16,
    2868,
];

/// Uncompensated temperature of the datasheet example.
pub const DATASHEET_UT: u16 = 27898;

/// Uncompensated pressure of the datasheet example (oss = 0).
pub const DATASHEET_UP: u16 = 23843;
