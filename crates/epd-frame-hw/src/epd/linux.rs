//! Binding of [`DeviceSession`] to Linux spidev and GPIO character devices.

use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::{CdevPin, Delay, SpidevDevice};
use tracing::{debug, info};

use super::{DeviceSession, PanelConfig, PanelPins};
use crate::Result;

const CONSUMER: &str = "epd-frame";

/// A panel session on real hardware.
pub type LinuxSession = DeviceSession<SpidevDevice, CdevPin, CdevPin, Delay>;

/// Opens the SPI device and GPIO lines named in `config`, then initializes the panel.
pub fn open(config: &PanelConfig) -> Result<LinuxSession> {
    let mut spi = SpidevDevice::open(&config.spi)?;
    let options = SpidevOptions::new()
        .bits_per_word(8)
        .max_speed_hz(config.spi_speed_hz)
        .mode(SpiModeFlags::SPI_MODE_0)
        .lsb_first(false)
        .build();
    spi.0.configure(&options)?;
    debug!("Opened {} at {} Hz", config.spi, config.spi_speed_hz);

    let mut chip = Chip::new(&config.gpio_chip)?;
    let mut output = |offset: u32| -> Result<CdevPin> {
        let handle = chip
            .get_line(offset)?
            .request(LineRequestFlags::OUTPUT, 0, CONSUMER)?;
        Ok(CdevPin::new(handle)?)
    };
    let reset = output(config.reset_pin)?;
    let dc = output(config.dc_pin)?;
    let power = output(config.power_pin)?;
    let busy = CdevPin::new(
        chip.get_line(config.busy_pin)?
            .request(LineRequestFlags::INPUT, 0, CONSUMER)?,
    )?;

    info!(
        "Opening panel on {} (rst={} dc={} pwr={} busy={})",
        config.spi, config.reset_pin, config.dc_pin, config.power_pin, config.busy_pin
    );

    let pins = PanelPins {
        reset,
        dc,
        power,
        busy,
    };
    DeviceSession::open(spi, pins, Delay, config.timing())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::PaletteColor;

    #[test]
    fn test_open_missing_device() {
        let config = PanelConfig {
            spi: "/dev/nonexistent-spidev".to_string(),
            ..PanelConfig::default()
        };
        assert!(open(&config).is_err());
    }

    #[test]
    #[ignore = "requires the panel on /dev/spidev0.0"]
    fn test_clear_on_hardware() {
        let mut session = open(&PanelConfig::default()).unwrap();
        session.clear(PaletteColor::White).unwrap();
        session.close().unwrap();
    }
}
