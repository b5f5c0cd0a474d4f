//! EPD Frame Hardware Library
//!
//! Converts RGB rasters into the packed 4-bit-per-pixel format understood by
//! 800x480 six-color e-paper controllers, and drives the panel over SPI.

pub mod dither;
pub mod epd;
pub mod error;
pub mod orientation;
pub mod packer;
pub mod palette;
pub mod pattern;
pub mod pipeline;
pub mod raster;

pub use dither::Dither;
pub use epd::{DeviceSession, PanelConfig, PanelPins, SessionState, Timing};
pub use error::{Error, Result};
pub use orientation::Orientation;
pub use palette::{nearest, PaletteColor, PALETTE};
pub use raster::Raster;

/// Panel dimensions (landscape, controller native)
pub const EPD_WIDTH: usize = 800;
pub const EPD_HEIGHT: usize = 480;

/// Packed buffer length: two pixels per byte.
pub const PACKED_LEN: usize = EPD_WIDTH * EPD_HEIGHT / 2;
