//! Raster orientation support.
//!
//! The controller only scans landscape (800x480). Portrait rasters (480x800)
//! are rotated 90° counter-clockwise in software before dithering.

use crate::raster::Raster;
use crate::{Error, Result, EPD_HEIGHT, EPD_WIDTH};
use std::str::FromStr;

/// Raster orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Landscape (800x480), controller native.
    #[default]
    Landscape,
    /// Portrait (480x800), software rotated.
    Portrait,
}

impl Orientation {
    /// Classifies a raster by its dimensions.
    pub fn detect(width: usize, height: usize) -> Result<Self> {
        match (width, height) {
            (EPD_WIDTH, EPD_HEIGHT) => Ok(Orientation::Landscape),
            (EPD_HEIGHT, EPD_WIDTH) => Ok(Orientation::Portrait),
            _ => Err(Error::DimensionMismatch { width, height }),
        }
    }

    /// Returns true if this orientation requires software rotation.
    pub fn needs_rotation(&self) -> bool {
        matches!(self, Orientation::Portrait)
    }

    /// Returns the raster dimensions for this orientation.
    pub fn dimensions(&self) -> (usize, usize) {
        match self {
            Orientation::Landscape => (EPD_WIDTH, EPD_HEIGHT),
            Orientation::Portrait => (EPD_HEIGHT, EPD_WIDTH),
        }
    }

    /// Returns a landscape raster, rotating portrait input.
    pub fn normalize(raster: Raster) -> Result<Raster> {
        if Self::detect(raster.width(), raster.height())?.needs_rotation() {
            Ok(Self::rotate_ccw(&raster))
        } else {
            Ok(raster)
        }
    }

    /// Rotates a raster 90° counter-clockwise.
    ///
    /// Output pixel `(x, y)` comes from input pixel `(h - 1 - y, x)`, where
    /// `h` is the output height (the input's width), so the input's right
    /// edge becomes the output's top edge.
    pub fn rotate_ccw(raster: &Raster) -> Raster {
        let (in_w, in_h) = (raster.width(), raster.height());
        let (out_w, out_h) = (in_h, in_w);
        let src = raster.pixels();
        let mut out = Raster::new(out_w, out_h);
        let dst = out.pixels_mut();
        for y in 0..out_h {
            let sx = out_h - 1 - y;
            for x in 0..out_w {
                dst[y * out_w + x] = src[x * in_w + sx];
            }
        }
        out
    }
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "landscape" => Ok(Orientation::Landscape),
            "portrait" => Ok(Orientation::Portrait),
            _ => Err(Error::InvalidOrientation(s.to_string())),
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Landscape => write!(f, "landscape"),
            Orientation::Portrait => write!(f, "portrait"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_detect() {
        assert_eq!(Orientation::detect(800, 480).unwrap(), Orientation::Landscape);
        assert_eq!(Orientation::detect(480, 800).unwrap(), Orientation::Portrait);
        assert!(matches!(
            Orientation::detect(640, 480),
            Err(Error::DimensionMismatch {
                width: 640,
                height: 480
            })
        ));
    }

    #[test]
    fn test_dimensions() {
        assert_eq!(Orientation::Landscape.dimensions(), (800, 480));
        assert_eq!(Orientation::Portrait.dimensions(), (480, 800));
        assert!(Orientation::Portrait.needs_rotation());
        assert!(!Orientation::Landscape.needs_rotation());
    }

    #[test]
    fn test_landscape_passthrough() {
        let mut raster = Raster::panel();
        raster.set_pixel(3, 4, [1, 2, 3]);
        let out = Orientation::normalize(raster.clone()).unwrap();
        assert_eq!(out, raster);
    }

    #[test]
    fn test_portrait_corners() {
        let mut raster = Raster::new(480, 800);
        raster.set_pixel(479, 0, [255, 0, 0]); // top-right
        raster.set_pixel(0, 0, [0, 255, 0]); // top-left
        raster.set_pixel(0, 799, [0, 0, 255]); // bottom-left
        let out = Orientation::normalize(raster).unwrap();
        assert_eq!((out.width(), out.height()), (800, 480));
        assert_eq!(out.get_pixel(0, 0), Some([255, 0, 0]));
        assert_eq!(out.get_pixel(0, 479), Some([0, 255, 0]));
        assert_eq!(out.get_pixel(799, 479), Some([0, 0, 255]));
    }

    #[test]
    fn test_normalize_rejects_other_sizes() {
        assert!(Orientation::normalize(Raster::new(800, 600)).is_err());
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "landscape".parse::<Orientation>().unwrap(),
            Orientation::Landscape
        );
        assert_eq!(
            "Portrait".parse::<Orientation>().unwrap(),
            Orientation::Portrait
        );
        assert!("sideways".parse::<Orientation>().is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn rotation_preserves_pixel_multiset(seed: u64) {
            let data: Vec<[u8; 3]> = (0..480 * 800u64)
                .map(|i| {
                    let v = i.wrapping_mul(seed | 1).wrapping_add(seed >> 7);
                    [v as u8, (v >> 8) as u8, (v >> 16) as u8]
                })
                .collect();
            let raster = Raster::from_pixels(480, 800, data).unwrap();
            let out = Orientation::normalize(raster.clone()).unwrap();

            let mut before = raster.pixels().to_vec();
            let mut after = out.pixels().to_vec();
            before.sort_unstable();
            after.sort_unstable();
            prop_assert_eq!(before, after);
        }
    }
}
