//! Panel test patterns.

use crate::palette::{PaletteColor, PALETTE};
use crate::raster::Raster;
use crate::{Error, Result, EPD_HEIGHT, EPD_WIDTH};

/// Six vertical bands, one per palette color in palette order.
///
/// The last band absorbs the columns left over by integer division.
pub fn stripes() -> Raster {
    let mut raster = Raster::panel();
    let band = EPD_WIDTH / PALETTE.len();
    for (i, &(_, rgb)) in PALETTE.iter().enumerate() {
        let start = i * band;
        let width = if i == PALETTE.len() - 1 {
            EPD_WIDTH - start
        } else {
            band
        };
        raster.fill_rect(start, 0, width, EPD_HEIGHT, rgb);
    }
    raster
}

/// A rectangular border `thickness` pixels wide, inset by `margin`, on black.
pub fn frame(margin: usize, thickness: usize, color: PaletteColor) -> Result<Raster> {
    if thickness == 0 || margin + thickness > EPD_HEIGHT / 2 {
        return Err(Error::InvalidPattern(format!(
            "margin {margin} + thickness {thickness} must be within 1..={}",
            EPD_HEIGHT / 2
        )));
    }

    let mut raster = Raster::panel();
    let rgb = color.rgb();
    let inner_w = EPD_WIDTH - 2 * margin;
    let inner_h = EPD_HEIGHT - 2 * margin;

    // Top and bottom
    raster.fill_rect(margin, margin, inner_w, thickness, rgb);
    raster.fill_rect(margin, EPD_HEIGHT - margin - thickness, inner_w, thickness, rgb);
    // Left and right
    raster.fill_rect(margin, margin, thickness, inner_h, rgb);
    raster.fill_rect(EPD_WIDTH - margin - thickness, margin, thickness, inner_h, rgb);

    Ok(raster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::pack;

    #[test]
    fn test_stripes() {
        let raster = stripes();
        assert_eq!(raster.get_pixel(0, 0), Some(PaletteColor::Black.rgb()));
        assert_eq!(raster.get_pixel(133, 240), Some(PaletteColor::White.rgb()));
        assert_eq!(raster.get_pixel(799, 479), Some(PaletteColor::Green.rgb()));

        let packed = pack(&raster).unwrap();
        assert_eq!(packed[0], 0x00);
        assert_eq!(packed[399], 0x66);
    }

    #[test]
    fn test_frame() {
        let raster = frame(20, 3, PaletteColor::White).unwrap();
        let white = Some(PaletteColor::White.rgb());
        let black = Some(PaletteColor::Black.rgb());
        assert_eq!(raster.get_pixel(19, 19), black);
        assert_eq!(raster.get_pixel(20, 20), white);
        assert_eq!(raster.get_pixel(22, 240), white);
        assert_eq!(raster.get_pixel(23, 240), black);
        assert_eq!(raster.get_pixel(779, 459), white);
        assert_eq!(raster.get_pixel(780, 460), black);
        assert_eq!(raster.get_pixel(400, 240), black);
    }

    #[test]
    fn test_frame_rejects_oversized() {
        assert!(frame(200, 41, PaletteColor::Red).is_err());
        assert!(frame(10, 0, PaletteColor::Red).is_err());
        assert!(frame(200, 40, PaletteColor::Red).is_ok());
    }
}
