//! 4-bit-per-pixel packing for the controller's RAM write.
//!
//! Byte `k` holds pixel `2k` in its high nibble and pixel `2k + 1` in its
//! low nibble, each as a palette id.

use crate::palette::{nearest, PaletteColor};
use crate::raster::Raster;
use crate::{Error, Result, PACKED_LEN};

/// Packs a dithered raster into controller byte order.
///
/// Pixels are looked up with the quantizer, so a raster that already holds
/// only palette colors maps to exactly those ids.
pub fn pack(raster: &Raster) -> Result<Vec<u8>> {
    let pixels = raster.pixels();
    if pixels.len() % 2 != 0 {
        return Err(Error::OddPixelCount(pixels.len()));
    }
    Ok(pixels
        .chunks_exact(2)
        .map(|pair| (nearest(pair[0]).id() << 4) | nearest(pair[1]).id())
        .collect())
}

/// Splits a packed buffer back into palette colors, two per byte.
pub fn unpack(packed: &[u8]) -> Result<Vec<PaletteColor>> {
    let mut colors = Vec::with_capacity(packed.len() * 2);
    for &byte in packed {
        colors.push(PaletteColor::from_id(byte >> 4)?);
        colors.push(PaletteColor::from_id(byte & 0x0F)?);
    }
    Ok(colors)
}

/// Returns a full-panel buffer filled with one color.
pub fn solid(color: PaletteColor) -> Vec<u8> {
    vec![color.fill_byte(); PACKED_LEN]
}

/// Checks that a buffer matches the panel RAM size.
pub fn validate_len(packed: &[u8]) -> Result<()> {
    if packed.len() != PACKED_LEN {
        return Err(Error::SizeMismatch {
            expected: PACKED_LEN,
            actual: packed.len(),
        });
    }
    Ok(())
}
