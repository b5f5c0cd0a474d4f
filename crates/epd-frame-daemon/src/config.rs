//! Configuration management.

use anyhow::{Context, Result};
use epd_frame_hw::{PaletteColor, PanelConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server listen address (e.g., "0.0.0.0:50051")
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Reply only after the panel has refreshed. When false, valid payloads
    /// are answered with QUEUED and displayed in the background.
    #[serde(default = "default_wait_for_refresh")]
    pub wait_for_refresh: bool,

    /// Palette color to clear to before sleeping on shutdown, or "none"
    #[serde(default = "default_clear_on_shutdown")]
    pub clear_on_shutdown: String,

    /// Run without a panel: payloads are validated and answered but not displayed
    #[serde(default)]
    pub headless: bool,

    /// Panel wiring
    #[serde(default)]
    pub panel: PanelConfig,
}

fn default_listen() -> String {
    "0.0.0.0:50051".to_string()
}

fn default_wait_for_refresh() -> bool {
    true
}

fn default_clear_on_shutdown() -> String {
    "white".to_string()
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse configuration")?;
        config.shutdown_color()?;
        Ok(config)
    }

    /// Color to clear the panel to on shutdown.
    pub fn shutdown_color(&self) -> Result<Option<PaletteColor>> {
        if self.clear_on_shutdown.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        let color = self
            .clear_on_shutdown
            .parse()
            .context("Invalid clear_on_shutdown color")?;
        Ok(Some(color))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            wait_for_refresh: default_wait_for_refresh(),
            clear_on_shutdown: default_clear_on_shutdown(),
            headless: false,
            panel: PanelConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.listen, "0.0.0.0:50051");
        assert!(config.wait_for_refresh);
        assert_eq!(config.shutdown_color().unwrap(), Some(PaletteColor::White));
        assert_eq!(config.panel.busy_pin, 24);
        assert!(!config.headless);
    }

    #[test]
    fn test_panel_section() {
        let config: Config = toml::from_str(
            r#"
            wait_for_refresh = false
            clear_on_shutdown = "none"
            headless = true

            [panel]
            spi = "/dev/spidev1.0"
            busy_timeout_ms = 30000
            "#,
        )
        .unwrap();
        assert!(!config.wait_for_refresh);
        assert_eq!(config.shutdown_color().unwrap(), None);
        assert!(config.headless);
        assert_eq!(config.panel.spi, "/dev/spidev1.0");
        assert_eq!(config.panel.dc_pin, 25);
        assert_eq!(config.panel.busy_timeout_ms, 30000);
    }

    #[test]
    fn test_invalid_shutdown_color() {
        let config = Config {
            clear_on_shutdown: "purple".to_string(),
            ..Config::default()
        };
        assert!(config.shutdown_color().is_err());
    }
}
