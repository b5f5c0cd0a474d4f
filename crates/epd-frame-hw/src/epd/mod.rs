//! Six-color e-paper panel driver.

mod config;
mod device;
#[cfg(any(test, feature = "test-util"))]
pub mod fake;
pub mod linux;
pub mod protocol;

pub use config::{PanelConfig, Timing};
pub use device::{DeviceSession, PanelPins, SessionState};
