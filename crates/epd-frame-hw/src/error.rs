//! Error types for the EPD Frame hardware library.

use std::time::Duration;

use thiserror::Error;

use crate::epd::SessionState;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the pixel pipeline or while driving the panel.
#[derive(Error, Debug)]
pub enum Error {
    /// Raster is neither landscape nor portrait panel resolution.
    #[error("Raster is {width}x{height}, expected 800x480 or 480x800")]
    DimensionMismatch { width: usize, height: usize },

    /// Packing needs an even number of pixels.
    #[error("Cannot pack an odd pixel count: {0}")]
    OddPixelCount(usize),

    /// Packed buffer does not match the panel RAM size.
    #[error("Buffer size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Raw RGB data does not match the requested raster dimensions.
    #[error("Raster size mismatch: expected {expected} bytes, got {actual}")]
    RasterSize { expected: usize, actual: usize },

    /// SPI transfer or GPIO line access failed.
    #[error("Bus error: {0}")]
    Bus(String),

    /// Busy line never reported idle.
    #[error("Device busy for longer than {0:?}")]
    DeviceTimeout(Duration),

    /// Operation attempted on a session that is not idle.
    #[error("Panel session is {0}, reopen it before use")]
    SessionUnusable(SessionState),

    /// Unknown palette color name.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Nibble that does not name a palette color.
    #[error("Invalid color id: {0:#X}")]
    InvalidColorId(u8),

    /// Unknown dithering algorithm name.
    #[error("Invalid dither algorithm: {0}")]
    InvalidDither(String),

    /// Invalid orientation value.
    #[error("Invalid orientation: {0}")]
    InvalidOrientation(String),

    /// Test pattern geometry does not fit the panel.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// SPI device could not be opened.
    #[error("SPI device error: {0}")]
    Spi(#[from] linux_embedded_hal::SPIError),

    /// GPIO chip or line could not be requested.
    #[error("GPIO error: {0}")]
    Gpio(#[from] linux_embedded_hal::gpio_cdev::errors::Error),

    /// Device node I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps an embedded-hal bus or pin error.
    pub(crate) fn bus<E: std::fmt::Debug>(err: E) -> Self {
        Error::Bus(format!("{err:?}"))
    }

    /// Returns true if the session that produced this error must be reopened.
    pub fn is_fatal_to_session(&self) -> bool {
        matches!(
            self,
            Error::Bus(_) | Error::DeviceTimeout(_) | Error::SessionUnusable(_)
        )
    }
}
