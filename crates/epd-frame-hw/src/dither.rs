//! Error-diffusion dithering onto the panel palette.
//!
//! Both diffusers walk the raster row-major and only push error to pixels
//! that have not been visited yet. They skip an outer border instead of
//! clamping the kernel; border pixels are quantized straight after the
//! diffusion pass, after any error they received from inside.

use crate::palette::{nearest, Rgb};
use crate::raster::Raster;
use crate::{Error, Result};
use std::str::FromStr;

/// Floyd–Steinberg kernel as (dx, dy, weight/16).
const FLOYD_STEINBERG: [(isize, usize, i32); 4] = [(1, 0, 7), (-1, 1, 3), (0, 1, 5), (1, 1, 1)];

/// Atkinson neighbours, each receiving 1/8 of the error.
const ATKINSON: [(isize, usize); 6] = [(1, 0), (2, 0), (-1, 1), (0, 1), (1, 1), (0, 2)];

/// Dithering algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dither {
    /// Floyd–Steinberg, diffuses the full error.
    FloydSteinberg,
    /// Atkinson, diffuses 6/8 of the error for higher contrast.
    #[default]
    Atkinson,
    /// Nearest-color quantization only.
    None,
}

impl Dither {
    /// Replaces every pixel of `raster` with a palette color.
    pub fn apply(self, raster: &mut Raster) {
        match self {
            Dither::FloydSteinberg => floyd_steinberg(raster),
            Dither::Atkinson => atkinson(raster),
            Dither::None => {}
        }
        quantize(raster);
    }
}

/// Maps every pixel to its nearest palette color.
pub fn quantize(raster: &mut Raster) {
    for px in raster.pixels_mut() {
        *px = nearest(*px).rgb();
    }
}

/// Quantizes one pixel in place and returns `original - chosen` per channel.
#[inline]
fn settle(px: &mut Rgb) -> [i32; 3] {
    let old = *px;
    let new = nearest(old).rgb();
    *px = new;
    [
        i32::from(old[0]) - i32::from(new[0]),
        i32::from(old[1]) - i32::from(new[1]),
        i32::from(old[2]) - i32::from(new[2]),
    ]
}

#[inline]
fn spread(px: &mut Rgb, err: [i32; 3]) {
    for (channel, e) in px.iter_mut().zip(err) {
        *channel = (i32::from(*channel) + e).clamp(0, 255) as u8;
    }
}

fn floyd_steinberg(raster: &mut Raster) {
    let (w, h) = (raster.width(), raster.height());
    let data = raster.pixels_mut();
    for y in 0..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let err = settle(&mut data[y * w + x]);
            for (dx, dy, weight) in FLOYD_STEINBERG {
                let nx = x.wrapping_add_signed(dx);
                let share = err.map(|e| e * weight / 16);
                spread(&mut data[(y + dy) * w + nx], share);
            }
        }
    }
}

fn atkinson(raster: &mut Raster) {
    let (w, h) = (raster.width(), raster.height());
    let data = raster.pixels_mut();
    for y in 0..h.saturating_sub(2) {
        for x in 0..w.saturating_sub(2) {
            let err = settle(&mut data[y * w + x]).map(|e| e / 8);
            for (dx, dy) in ATKINSON {
                let Some(nx) = x.checked_add_signed(dx) else {
                    continue;
                };
                spread(&mut data[(y + dy) * w + nx], err);
            }
        }
    }
}

impl FromStr for Dither {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "floyd-steinberg" | "floyd_steinberg" | "floyd" | "fs" => Ok(Dither::FloydSteinberg),
            "atkinson" => Ok(Dither::Atkinson),
            "none" => Ok(Dither::None),
            _ => Err(Error::InvalidDither(s.to_string())),
        }
    }
}

impl std::fmt::Display for Dither {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dither::FloydSteinberg => write!(f, "floyd-steinberg"),
            Dither::Atkinson => write!(f, "atkinson"),
            Dither::None => write!(f, "none"),
        }
    }
}
