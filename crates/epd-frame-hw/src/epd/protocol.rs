//! Controller register map and fixed command sequences.
//!
//! Every command byte is sent with DC low, every data byte with DC high,
//! one byte per SPI transfer.

/// Controller commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    DriverOutput = 0x00,
    PanelSetting = 0x01,
    PowerOff = 0x02,
    ResSetting = 0x03,
    PowerOn = 0x04,
    BoosterSoftStart1 = 0x05,
    BoosterSoftStart2 = 0x06,
    DeepSleep = 0x07,
    BoosterSoftStart3 = 0x08,
    /// Start of pixel RAM write.
    WriteRam = 0x10,
    DisplayRefresh = 0x12,
    Pll = 0x30,
    Vcom = 0x50,
    Tcon = 0x60,
    Resolution = 0x61,
    TemperatureSensor = 0x84,
    PowerSaving = 0xE3,
    Cmdh = 0xAA,
}

/// Second booster soft-start block, also re-sent before every refresh.
pub const BOOSTER_SOFT_START_2: [u8; 4] = [0x6F, 0x1F, 0x17, 0x49];

/// Deep sleep check code.
pub const DEEP_SLEEP_CHECK: u8 = 0xA5;

/// Register writes issued after reset, before power-on.
pub const INIT_SEQUENCE: &[(Command, &[u8])] = &[
    (Command::Cmdh, &[0x49, 0x55, 0x20, 0x08, 0x09, 0x18]),
    (Command::PanelSetting, &[0x3F]),
    (Command::DriverOutput, &[0x5F, 0x69]),
    (Command::ResSetting, &[0x00, 0x54, 0x00, 0x44]),
    (Command::BoosterSoftStart1, &[0x40, 0x1F, 0x1F, 0x2C]),
    (Command::BoosterSoftStart2, &BOOSTER_SOFT_START_2),
    (Command::BoosterSoftStart3, &[0x6F, 0x1F, 0x1F, 0x22]),
    (Command::Pll, &[0x03]),
    (Command::Vcom, &[0x3F]),
    (Command::Tcon, &[0x02, 0x00]),
    // 800 (0x0320) x 480 (0x01E0)
    (Command::Resolution, &[0x03, 0x20, 0x01, 0xE0]),
    (Command::TemperatureSensor, &[0x01]),
    (Command::PowerSaving, &[0x2F]),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EPD_HEIGHT, EPD_WIDTH};

    #[test]
    fn test_resolution_matches_panel() {
        let (_, data) = INIT_SEQUENCE
            .iter()
            .find(|(cmd, _)| *cmd == Command::Resolution)
            .unwrap();
        let width = u16::from_be_bytes([data[0], data[1]]) as usize;
        let height = u16::from_be_bytes([data[2], data[3]]) as usize;
        assert_eq!((width, height), (EPD_WIDTH, EPD_HEIGHT));
    }

    #[test]
    fn test_init_sequence_order() {
        let commands: Vec<u8> = INIT_SEQUENCE.iter().map(|(c, _)| *c as u8).collect();
        assert_eq!(
            commands,
            vec![0xAA, 0x01, 0x00, 0x03, 0x05, 0x06, 0x08, 0x30, 0x50, 0x60, 0x61, 0x84, 0xE3]
        );
    }
}
