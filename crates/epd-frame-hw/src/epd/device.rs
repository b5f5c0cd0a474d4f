//! Panel session: reset, init, refresh and sleep over generic SPI and GPIO.

use std::fmt;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;
use tracing::{debug, info, warn};

use super::config::Timing;
use super::protocol::{Command, BOOSTER_SOFT_START_2, DEEP_SLEEP_CHECK, INIT_SEQUENCE};
use crate::packer::{solid, validate_len};
use crate::palette::PaletteColor;
use crate::{Error, Result};

/// Control lines wired to the panel.
pub struct PanelPins<O, I> {
    pub reset: O,
    /// Data/command select: low for command bytes, high for data bytes.
    pub dc: O,
    pub power: O,
    /// Low while the controller is busy.
    pub busy: I,
}

/// Lifecycle of a [`DeviceSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Opening,
    Idle,
    Busy,
    /// A bus error or timeout left the controller in an unknown state.
    Faulted,
    Sleeping,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Opening => "opening",
            SessionState::Idle => "idle",
            SessionState::Busy => "busy",
            SessionState::Faulted => "faulted",
            SessionState::Sleeping => "sleeping",
            SessionState::Closed => "closed",
        };
        write!(f, "{}", name)
    }
}

struct Hardware<SPI, O, I, D> {
    spi: SPI,
    pins: PanelPins<O, I>,
    delay: D,
}

impl<SPI, O, I, D> Hardware<SPI, O, I, D>
where
    SPI: SpiDevice,
    O: OutputPin,
    I: InputPin,
    D: DelayNs,
{
    fn command(&mut self, command: Command) -> Result<()> {
        self.pins.dc.set_low().map_err(Error::bus)?;
        self.spi.write(&[command as u8]).map_err(Error::bus)
    }

    fn data(&mut self, byte: u8) -> Result<()> {
        self.pins.dc.set_high().map_err(Error::bus)?;
        self.spi.write(&[byte]).map_err(Error::bus)
    }

    fn send(&mut self, command: Command, data: &[u8]) -> Result<()> {
        self.command(command)?;
        for &byte in data {
            self.data(byte)?;
        }
        Ok(())
    }

    fn pause(&mut self, duration: Duration) {
        self.delay.delay_us(duration.as_micros().min(u32::MAX as u128) as u32);
    }

    /// Polls the busy line until it reads high, bounded by the busy timeout.
    fn wait_idle(&mut self, timing: &Timing) -> Result<()> {
        let step = timing.busy_poll.max(Duration::from_micros(1));
        let mut waited = Duration::ZERO;
        loop {
            if self.pins.busy.is_high().map_err(Error::bus)? {
                debug!("Busy released after {:?}", waited);
                return Ok(());
            }
            if waited >= timing.busy_timeout {
                warn!("Panel still busy after {:?}", waited);
                return Err(Error::DeviceTimeout(timing.busy_timeout));
            }
            self.pause(step);
            waited += step;
        }
    }

    fn reset(&mut self, timing: &Timing) -> Result<()> {
        for level in [true, false, true] {
            if level {
                self.pins.reset.set_high().map_err(Error::bus)?;
            } else {
                self.pins.reset.set_low().map_err(Error::bus)?;
            }
            self.pause(timing.reset_hold);
        }
        self.wait_idle(timing)
    }

    fn init(&mut self, timing: &Timing) -> Result<()> {
        self.pins.power.set_high().map_err(Error::bus)?;
        self.reset(timing)?;
        for &(command, data) in INIT_SEQUENCE {
            self.send(command, data)?;
        }
        self.command(Command::PowerOn)?;
        self.wait_idle(timing)
    }

    fn write_ram(&mut self, packed: &[u8]) -> Result<()> {
        debug!("Writing {} bytes to panel RAM", packed.len());
        self.send(Command::WriteRam, packed)
    }

    /// Powers on, refreshes from RAM and powers off again.
    fn turn_on(&mut self, timing: &Timing) -> Result<()> {
        self.command(Command::PowerOn)?;
        self.wait_idle(timing)?;
        self.send(Command::BoosterSoftStart2, &BOOSTER_SOFT_START_2)?;
        self.send(Command::DisplayRefresh, &[0x00])?;
        self.wait_idle(timing)?;
        self.send(Command::PowerOff, &[0x00])?;
        self.wait_idle(timing)
    }

    fn sleep(&mut self, timing: &Timing) -> Result<()> {
        self.send(Command::PowerOff, &[0x00])?;
        self.wait_idle(timing)?;
        self.send(Command::DeepSleep, &[DEEP_SLEEP_CHECK])
    }

    /// Drives every output line low.
    fn release(&mut self) -> Result<()> {
        self.pins.power.set_low().map_err(Error::bus)?;
        self.pins.dc.set_low().map_err(Error::bus)?;
        self.pins.reset.set_low().map_err(Error::bus)
    }
}

/// An open connection to the panel controller.
///
/// Owns the SPI device, control lines and delay source until [`close`]
/// (or drop) puts the panel to sleep and releases them. After any bus error
/// or busy timeout the session is [`SessionState::Faulted`] and refuses
/// further refreshes; close it and open a new one.
///
/// [`close`]: DeviceSession::close
pub struct DeviceSession<SPI, O, I, D>
where
    SPI: SpiDevice,
    O: OutputPin,
    I: InputPin,
    D: DelayNs,
{
    hw: Option<Hardware<SPI, O, I, D>>,
    timing: Timing,
    state: SessionState,
}

impl<SPI, O, I, D> DeviceSession<SPI, O, I, D>
where
    SPI: SpiDevice,
    O: OutputPin,
    I: InputPin,
    D: DelayNs,
{
    /// Resets and initializes the controller.
    ///
    /// On failure the control lines are driven low and the hardware handles
    /// are dropped before the error is returned.
    pub fn open(spi: SPI, pins: PanelPins<O, I>, delay: D, timing: Timing) -> Result<Self> {
        let mut session = Self {
            hw: Some(Hardware { spi, pins, delay }),
            timing,
            state: SessionState::Opening,
        };

        match session.transact(|hw, timing| hw.init(timing)) {
            Ok(()) => {
                info!("Panel initialized");
                Ok(session)
            }
            Err(e) => {
                if let Err(release) = session.close() {
                    warn!("Failed to release panel lines: {}", release);
                }
                Err(e)
            }
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Fills the whole panel with one color and refreshes.
    pub fn clear(&mut self, color: PaletteColor) -> Result<()> {
        debug!("Clearing panel to {}", color);
        self.display(&solid(color))
    }

    /// Writes a packed buffer to panel RAM and refreshes.
    ///
    /// A buffer of the wrong length is rejected before anything reaches the
    /// bus and leaves the session idle.
    pub fn display(&mut self, packed: &[u8]) -> Result<()> {
        validate_len(packed)?;
        self.ensure_idle()?;
        self.transact(|hw, timing| {
            hw.write_ram(packed)?;
            hw.turn_on(timing)
        })?;
        info!("Refresh complete");
        Ok(())
    }

    /// Puts the panel into deep sleep and releases the hardware.
    ///
    /// Sleep commands are skipped when the session is faulted. Calling this
    /// more than once is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut hw) = self.hw.take() else {
            self.state = SessionState::Closed;
            return Ok(());
        };

        let slept = if self.state == SessionState::Idle {
            self.state = SessionState::Sleeping;
            hw.sleep(&self.timing)
        } else {
            debug!("Skipping sleep sequence, session is {}", self.state);
            Ok(())
        };
        let released = hw.release();
        drop(hw);

        self.state = SessionState::Closed;
        info!("Panel closed");
        slept.and(released)
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(Error::SessionUnusable(self.state));
        }
        Ok(())
    }

    /// Runs a bus operation, faulting the session if it fails.
    fn transact<F>(&mut self, op: F) -> Result<()>
    where
        F: FnOnce(&mut Hardware<SPI, O, I, D>, &Timing) -> Result<()>,
    {
        let hw = self
            .hw
            .as_mut()
            .ok_or(Error::SessionUnusable(self.state))?;
        self.state = SessionState::Busy;
        match op(hw, &self.timing) {
            Ok(()) => {
                self.state = SessionState::Idle;
                Ok(())
            }
            Err(e) => {
                warn!("Panel operation failed: {}", e);
                self.state = SessionState::Faulted;
                Err(e)
            }
        }
    }
}

impl<SPI, O, I, D> Drop for DeviceSession<SPI, O, I, D>
where
    SPI: SpiDevice,
    O: OutputPin,
    I: InputPin,
    D: DelayNs,
{
    fn drop(&mut self) {
        if self.hw.is_some() {
            if let Err(e) = self.close() {
                warn!("Failed to close panel session: {}", e);
            }
        }
    }
}
