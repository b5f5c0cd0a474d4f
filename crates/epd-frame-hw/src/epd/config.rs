//! Panel wiring and timing configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Protocol timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Hold time for each step of the hardware reset pulse.
    pub reset_hold: Duration,
    /// Interval between busy line polls.
    pub busy_poll: Duration,
    /// Give up waiting for the busy line after this long.
    pub busy_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            reset_hold: Duration::from_millis(20),
            busy_poll: Duration::from_millis(1),
            busy_timeout: Duration::from_millis(default_busy_timeout_ms()),
        }
    }
}

/// Linux device nodes and GPIO line offsets for the panel HAT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// SPI device node
    #[serde(default = "default_spi")]
    pub spi: String,

    /// GPIO character device
    #[serde(default = "default_gpio_chip")]
    pub gpio_chip: String,

    #[serde(default = "default_reset_pin")]
    pub reset_pin: u32,

    /// Data/command select line
    #[serde(default = "default_dc_pin")]
    pub dc_pin: u32,

    #[serde(default = "default_power_pin")]
    pub power_pin: u32,

    #[serde(default = "default_busy_pin")]
    pub busy_pin: u32,

    /// SPI clock in Hz
    #[serde(default = "default_spi_speed")]
    pub spi_speed_hz: u32,

    /// Busy wait timeout in milliseconds
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            spi: default_spi(),
            gpio_chip: default_gpio_chip(),
            reset_pin: default_reset_pin(),
            dc_pin: default_dc_pin(),
            power_pin: default_power_pin(),
            busy_pin: default_busy_pin(),
            spi_speed_hz: default_spi_speed(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl PanelConfig {
    /// Returns protocol timing with this config's busy timeout.
    pub fn timing(&self) -> Timing {
        Timing {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
            ..Timing::default()
        }
    }
}

fn default_spi() -> String {
    "/dev/spidev0.0".to_string()
}

fn default_gpio_chip() -> String {
    "/dev/gpiochip0".to_string()
}

fn default_reset_pin() -> u32 {
    17
}

fn default_dc_pin() -> u32 {
    25
}

fn default_power_pin() -> u32 {
    18
}

fn default_busy_pin() -> u32 {
    24
}

fn default_spi_speed() -> u32 {
    10_000_000
}

fn default_busy_timeout_ms() -> u64 {
    60_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_from_config() {
        let config = PanelConfig {
            busy_timeout_ms: 250,
            ..PanelConfig::default()
        };
        let timing = config.timing();
        assert_eq!(timing.busy_timeout, Duration::from_millis(250));
        assert_eq!(timing.reset_hold, Duration::from_millis(20));
        assert_eq!(timing.busy_poll, Duration::from_millis(1));
    }

    #[test]
    fn test_defaults() {
        let config = PanelConfig::default();
        assert_eq!(config.spi, "/dev/spidev0.0");
        assert_eq!(
            (config.reset_pin, config.dc_pin, config.power_pin, config.busy_pin),
            (17, 25, 18, 24)
        );
        assert_eq!(Timing::default().busy_timeout, Duration::from_secs(60));
    }
}
