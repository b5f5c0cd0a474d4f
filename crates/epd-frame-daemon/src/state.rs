//! Application state management.

use anyhow::{bail, Context, Result};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;
use epd_frame_client::Status;
use epd_frame_hw::epd::linux;
use epd_frame_hw::packer::validate_len;
use epd_frame_hw::{DeviceSession, PaletteColor, SessionState};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::config::Config;

/// Panel operations the daemon drives.
pub trait Session: Send {
    fn state(&self) -> SessionState;
    fn display(&mut self, packed: &[u8]) -> epd_frame_hw::Result<()>;
    fn clear(&mut self, color: PaletteColor) -> epd_frame_hw::Result<()>;
    fn close(&mut self) -> epd_frame_hw::Result<()>;
}

impl<SPI, O, I, D> Session for DeviceSession<SPI, O, I, D>
where
    SPI: SpiDevice + Send,
    O: OutputPin + Send,
    I: InputPin + Send,
    D: DelayNs + Send,
{
    fn state(&self) -> SessionState {
        DeviceSession::state(self)
    }

    fn display(&mut self, packed: &[u8]) -> epd_frame_hw::Result<()> {
        DeviceSession::display(self, packed)
    }

    fn clear(&mut self, color: PaletteColor) -> epd_frame_hw::Result<()> {
        DeviceSession::clear(self, color)
    }

    fn close(&mut self) -> epd_frame_hw::Result<()> {
        DeviceSession::close(self)
    }
}

/// Opens and initializes a new panel session.
pub type Opener = Box<dyn Fn() -> epd_frame_hw::Result<Box<dyn Session>> + Send + Sync>;

/// Panel ownership shared by connection tasks.
struct Panel {
    session: Option<Box<dyn Session>>,
    /// Set once shutdown starts. Nothing reaches the panel afterwards.
    shut_down: bool,
}

/// Buffer waiting for the panel when replies don't wait for the refresh.
#[derive(Default)]
struct Pending {
    buffer: Option<Vec<u8>>,
    draining: bool,
}

/// Shared application state.
pub struct AppState {
    config: Config,
    /// `None` in headless mode.
    opener: Option<Opener>,
    panel: Mutex<Panel>,
    pending: Mutex<Pending>,
}

impl AppState {
    /// Opens the panel unless the config asks for headless mode. Blocks for
    /// the reset and init sequence.
    pub fn new(config: Config) -> Self {
        if config.headless {
            info!("Running in headless mode");
            return Self::headless(config);
        }

        let panel = config.panel.clone();
        Self::with_opener(
            config,
            Box::new(move || -> epd_frame_hw::Result<Box<dyn Session>> {
                let session = linux::open(&panel)?;
                info!("Panel opened on {}", panel.spi);
                Ok(Box::new(session) as Box<dyn Session>)
            }),
        )
    }

    /// State that opens panel sessions through `opener`.
    ///
    /// A failed first open is not fatal: it is retried for the next payload.
    pub fn with_opener(config: Config, opener: Opener) -> Self {
        let session = match opener() {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("Panel not available: {}. Retrying on the next payload.", e);
                None
            }
        };
        Self::build(config, Some(opener), session)
    }

    /// State without a panel. Valid payloads are answered but not displayed.
    pub fn headless(config: Config) -> Self {
        Self::build(config, None, None)
    }

    fn build(config: Config, opener: Option<Opener>, session: Option<Box<dyn Session>>) -> Self {
        Self {
            config,
            opener,
            panel: Mutex::new(Panel {
                session,
                shut_down: false,
            }),
            pending: Mutex::default(),
        }
    }

    /// Validates a payload and displays it, or queues it for display.
    ///
    /// Returns an error when a payload could not be displayed; the caller
    /// drops the connection without a status.
    pub async fn handle(self: &Arc<Self>, payload: Vec<u8>) -> Result<Status> {
        if let Err(e) = validate_len(&payload) {
            warn!("Rejected payload: {}", e);
            return Ok(Status::ImageSizeMismatch);
        }

        if !self.config.wait_for_refresh {
            if self.enqueue(payload) {
                let state = self.clone();
                tokio::task::spawn_blocking(move || state.drain());
            }
            return Ok(Status::Queued);
        }

        let state = self.clone();
        tokio::task::spawn_blocking(move || state.display(&payload))
            .await
            .context("Display task panicked")??;
        Ok(Status::Ok)
    }

    /// Makes `payload` the next buffer to show, replacing an older one.
    /// Returns true when no drain task is running and one must be started.
    fn enqueue(&self, payload: Vec<u8>) -> bool {
        let mut pending = lock(&self.pending);
        if pending.buffer.replace(payload).is_some() {
            debug!("Dropped a pending buffer for a newer one");
        }
        !std::mem::replace(&mut pending.draining, true)
    }

    /// Displays pending buffers until none is left.
    fn drain(&self) {
        loop {
            let next = {
                let mut pending = lock(&self.pending);
                match pending.buffer.take() {
                    Some(buffer) => buffer,
                    None => {
                        pending.draining = false;
                        return;
                    }
                }
            };
            if let Err(e) = self.display(&next) {
                warn!("Queued refresh failed: {:#}", e);
            }
        }
    }

    /// Writes a validated buffer to the panel, opening a new session if the
    /// previous one faulted or never opened.
    fn display(&self, packed: &[u8]) -> Result<()> {
        let mut panel = lock(&self.panel);
        if panel.shut_down {
            bail!("Shutting down, buffer not displayed");
        }
        let Some(opener) = &self.opener else {
            debug!("Headless, discarding {} byte buffer", packed.len());
            return Ok(());
        };

        let mut session = match panel.session.take() {
            Some(session) => session,
            None => {
                info!("Reopening panel");
                opener().context("Failed to open panel")?
            }
        };

        match session.display(packed) {
            Ok(()) => {
                panel.session = Some(session);
                Ok(())
            }
            Err(e) if e.is_fatal_to_session() => {
                warn!("Closing faulted panel session: {}", e);
                if let Err(close) = session.close() {
                    warn!("Failed to close panel: {}", close);
                }
                Err(e).context("Display failed")
            }
            Err(e) => {
                panel.session = Some(session);
                Err(e).context("Display failed")
            }
        }
    }

    /// Clears the panel to the configured shutdown color and puts it to sleep.
    /// Later payloads are refused.
    pub fn shutdown(&self) -> Result<()> {
        lock(&self.pending).buffer = None;

        let mut panel = lock(&self.panel);
        panel.shut_down = true;
        let Some(mut session) = panel.session.take() else {
            return Ok(());
        };

        if let Some(color) = self.config.shutdown_color()? {
            if session.state() == SessionState::Idle {
                info!("Clearing panel to {}", color);
                if let Err(e) = session.clear(color) {
                    warn!("Failed to clear panel on shutdown: {}", e);
                }
            }
        }

        session.close().context("Failed to close panel")
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
