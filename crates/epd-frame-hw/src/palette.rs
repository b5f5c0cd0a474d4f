//! Six-color panel palette and nearest-color quantizer.
//!
//! Controller color ids are not sequential: 0x4 is unused by the hardware.

use crate::{Error, Result};
use std::str::FromStr;

/// 8-bit RGB triplet.
pub type Rgb = [u8; 3];

/// A color the panel can show, discriminant is the controller's 4-bit id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PaletteColor {
    Black = 0x0,
    White = 0x1,
    Yellow = 0x2,
    Red = 0x3,
    Blue = 0x5,
    Green = 0x6,
}

/// Palette in iteration order. Quantizer ties resolve to the earliest entry.
pub const PALETTE: [(PaletteColor, Rgb); 6] = [
    (PaletteColor::Black, [0, 0, 0]),
    (PaletteColor::White, [255, 255, 255]),
    (PaletteColor::Yellow, [255, 255, 0]),
    (PaletteColor::Red, [255, 0, 0]),
    (PaletteColor::Blue, [0, 0, 255]),
    (PaletteColor::Green, [0, 255, 0]),
];

impl PaletteColor {
    /// Returns the 4-bit controller id.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Converts a 4-bit controller id to a palette color.
    pub fn from_id(id: u8) -> Result<Self> {
        PALETTE
            .iter()
            .map(|&(color, _)| color)
            .find(|color| color.id() == id)
            .ok_or(Error::InvalidColorId(id))
    }

    /// Returns the RGB value this color is rendered as.
    pub fn rgb(self) -> Rgb {
        match self {
            PaletteColor::Black => [0, 0, 0],
            PaletteColor::White => [255, 255, 255],
            PaletteColor::Yellow => [255, 255, 0],
            PaletteColor::Red => [255, 0, 0],
            PaletteColor::Blue => [0, 0, 255],
            PaletteColor::Green => [0, 255, 0],
        }
    }

    /// Byte that fills two adjacent pixels with this color.
    pub fn fill_byte(self) -> u8 {
        (self.id() << 4) | self.id()
    }
}

/// Returns the palette color closest to `rgb` by squared Euclidean distance.
pub fn nearest(rgb: Rgb) -> PaletteColor {
    let mut best = PALETTE[0].0;
    let mut best_dist = u32::MAX;
    for &(color, reference) in &PALETTE {
        let dist = distance_sq(rgb, reference);
        if dist < best_dist {
            best_dist = dist;
            best = color;
        }
    }
    best
}

#[inline]
fn distance_sq(a: Rgb, b: Rgb) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = i32::from(x) - i32::from(y);
            (d * d) as u32
        })
        .sum()
}

impl FromStr for PaletteColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "black" => Ok(PaletteColor::Black),
            "white" => Ok(PaletteColor::White),
            "yellow" => Ok(PaletteColor::Yellow),
            "red" => Ok(PaletteColor::Red),
            "blue" => Ok(PaletteColor::Blue),
            "green" => Ok(PaletteColor::Green),
            _ => Err(Error::InvalidColor(s.to_string())),
        }
    }
}

impl std::fmt::Display for PaletteColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaletteColor::Black => write!(f, "black"),
            PaletteColor::White => write!(f, "white"),
            PaletteColor::Yellow => write!(f, "yellow"),
            PaletteColor::Red => write!(f, "red"),
            PaletteColor::Blue => write!(f, "blue"),
            PaletteColor::Green => write!(f, "green"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_palette_ids_unique_and_4bit() {
        for (i, (a, _)) in PALETTE.iter().enumerate() {
            assert!(a.id() <= 0x0F);
            for (b, _) in &PALETTE[i + 1..] {
                assert_ne!(a.id(), b.id());
            }
        }
        assert!(PALETTE.iter().all(|(c, _)| c.id() != 0x4));
    }

    #[test]
    fn test_nearest_exact_match() {
        for &(color, rgb) in &PALETTE {
            assert_eq!(nearest(rgb), color);
        }
    }

    #[test]
    fn test_nearest_approximate() {
        assert_eq!(nearest([10, 12, 8]), PaletteColor::Black);
        assert_eq!(nearest([240, 250, 235]), PaletteColor::White);
        assert_eq!(nearest([200, 30, 20]), PaletteColor::Red);
        assert_eq!(nearest([230, 220, 40]), PaletteColor::Yellow);
        assert_eq!(nearest([20, 40, 200]), PaletteColor::Blue);
    }

    #[test]
    fn test_nearest_tie_prefers_first_entry() {
        // Equidistant from red and blue; red comes first.
        let purple = [128, 0, 128];
        assert_eq!(
            distance_sq(purple, PaletteColor::Red.rgb()),
            distance_sq(purple, PaletteColor::Blue.rgb())
        );
        assert_eq!(nearest(purple), PaletteColor::Red);
    }

    #[test]
    fn test_from_id() {
        assert_eq!(PaletteColor::from_id(0x5).unwrap(), PaletteColor::Blue);
        assert!(matches!(
            PaletteColor::from_id(0x4),
            Err(Error::InvalidColorId(0x4))
        ));
        assert!(PaletteColor::from_id(0x7).is_err());
    }

    #[test]
    fn test_rgb_matches_palette_table() {
        for &(color, rgb) in &PALETTE {
            assert_eq!(color.rgb(), rgb, "{color}");
        }
    }

    #[test]
    fn test_fill_byte() {
        assert_eq!(PaletteColor::White.fill_byte(), 0x11);
        assert_eq!(PaletteColor::Green.fill_byte(), 0x66);
        assert_eq!(PaletteColor::Black.fill_byte(), 0x00);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("red".parse::<PaletteColor>().unwrap(), PaletteColor::Red);
        assert_eq!("WHITE".parse::<PaletteColor>().unwrap(), PaletteColor::White);
        assert!("orange".parse::<PaletteColor>().is_err());
        assert_eq!(PaletteColor::Yellow.to_string(), "yellow");
    }

    proptest! {
        #[test]
        fn nearest_is_deterministic(r: u8, g: u8, b: u8) {
            let first = nearest([r, g, b]);
            prop_assert_eq!(first, nearest([r, g, b]));
            let d = distance_sq([r, g, b], first.rgb());
            for &(_, reference) in &PALETTE {
                prop_assert!(d <= distance_sq([r, g, b], reference));
            }
        }
    }
}
