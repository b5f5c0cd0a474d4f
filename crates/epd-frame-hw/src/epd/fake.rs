//! Recording fakes of the embedded-hal traits for driver tests.
//!
//! Built for this crate's tests and, with the `test-util` feature, for
//! downstream crates that drive a [`DeviceSession`] without hardware.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::spi::{self, Operation, SpiDevice};

use super::{DeviceSession, PanelPins};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Reset,
    Dc,
    Power,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Set(Line, bool),
    Byte(u8),
    Delay(u64),
    BusyRead(bool),
}

/// A byte as the controller sees it, classified by the DC level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    Command(u8),
    Data(u8),
}

#[derive(Debug)]
pub struct FakeError;

impl digital::Error for FakeError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

impl spi::Error for FakeError {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

type Log = Arc<Mutex<Vec<Event>>>;

fn entries(log: &Log) -> MutexGuard<'_, Vec<Event>> {
    log.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct FakeSpi {
    log: Log,
    written: usize,
    fail_at: Option<usize>,
}

impl spi::ErrorType for FakeSpi {
    type Error = FakeError;
}

impl SpiDevice for FakeSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), FakeError> {
        for op in operations.iter_mut() {
            if let Operation::Write(buf) = op {
                for &byte in buf.iter() {
                    if self.fail_at == Some(self.written) {
                        return Err(FakeError);
                    }
                    self.written += 1;
                    entries(&self.log).push(Event::Byte(byte));
                }
            }
        }
        Ok(())
    }
}

pub struct FakePin {
    line: Line,
    log: Log,
}

impl digital::ErrorType for FakePin {
    type Error = FakeError;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), FakeError> {
        entries(&self.log).push(Event::Set(self.line, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), FakeError> {
        entries(&self.log).push(Event::Set(self.line, true));
        Ok(())
    }
}

/// Busy line that reads low `busy_polls` times before each high read.
/// `None` keeps it low forever.
pub struct FakeBusy {
    log: Log,
    busy_polls: Option<usize>,
    seen: usize,
}

impl digital::ErrorType for FakeBusy {
    type Error = FakeError;
}

impl InputPin for FakeBusy {
    fn is_high(&mut self) -> Result<bool, FakeError> {
        let idle = match self.busy_polls {
            Some(polls) if self.seen >= polls => {
                self.seen = 0;
                true
            }
            _ => {
                self.seen += 1;
                false
            }
        };
        entries(&self.log).push(Event::BusyRead(idle));
        Ok(idle)
    }

    fn is_low(&mut self) -> Result<bool, FakeError> {
        self.is_high().map(|high| !high)
    }
}

pub struct FakeDelay {
    log: Log,
    total_ns: Arc<AtomicU64>,
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns.fetch_add(u64::from(ns), Ordering::Relaxed);
        entries(&self.log).push(Event::Delay(u64::from(ns)));
    }
}

/// Read side of the fakes, kept by the test after the session takes ownership.
#[derive(Clone)]
pub struct Recorder {
    log: Log,
    total_ns: Arc<AtomicU64>,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        entries(&self.log).clone()
    }

    pub fn clear(&self) {
        entries(&self.log).clear();
        self.total_ns.store(0, Ordering::Relaxed);
    }

    pub fn delayed_ns(&self) -> u64 {
        self.total_ns.load(Ordering::Relaxed)
    }

    /// SPI bytes classified by the DC level in effect when each was sent.
    pub fn transfers(&self) -> Vec<Transfer> {
        let mut dc = false;
        let mut out = Vec::new();
        for event in entries(&self.log).iter() {
            match *event {
                Event::Set(Line::Dc, level) => dc = level,
                Event::Byte(b) if dc => out.push(Transfer::Data(b)),
                Event::Byte(b) => out.push(Transfer::Command(b)),
                _ => {}
            }
        }
        out
    }
}

pub type FakeSession = DeviceSession<FakeSpi, FakePin, FakeBusy, FakeDelay>;

pub type Rig = (FakeSpi, PanelPins<FakePin, FakeBusy>, FakeDelay, Recorder);

/// Builds a fake SPI device, control lines and delay sharing one event log.
///
/// `busy_polls` is how many low reads precede each idle read (`None` never
/// goes idle). `fail_at` makes the SPI write of that byte index fail.
pub fn rig(busy_polls: Option<usize>, fail_at: Option<usize>) -> Rig {
    let log: Log = Arc::default();
    let total_ns = Arc::new(AtomicU64::new(0));
    let pin = |line| FakePin {
        line,
        log: log.clone(),
    };
    let pins = PanelPins {
        reset: pin(Line::Reset),
        dc: pin(Line::Dc),
        power: pin(Line::Power),
        busy: FakeBusy {
            log: log.clone(),
            busy_polls,
            seen: 0,
        },
    };
    let spi = FakeSpi {
        log: log.clone(),
        written: 0,
        fail_at,
    };
    let delay = FakeDelay {
        log: log.clone(),
        total_ns: total_ns.clone(),
    };
    (spi, pins, delay, Recorder { log, total_ns })
}
