//! RGB888 raster, the pixel pipeline's working image.

use crate::palette::Rgb;
use crate::{Error, Result, EPD_HEIGHT, EPD_WIDTH};

/// Row-major RGB raster with the origin at the top-left.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    /// Pixel data, one triplet per pixel.
    data: Vec<Rgb>,
    width: usize,
    height: usize,
}

impl Raster {
    /// Creates a raster initialized to black.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, [0, 0, 0])
    }

    /// Creates a landscape raster at panel resolution.
    pub fn panel() -> Self {
        Self::new(EPD_WIDTH, EPD_HEIGHT)
    }

    /// Creates a raster filled with one color.
    pub fn filled(width: usize, height: usize, rgb: Rgb) -> Self {
        Self {
            data: vec![rgb; width * height],
            width,
            height,
        }
    }

    /// Builds a raster from packed RGB8 bytes.
    pub fn from_rgb8(width: usize, height: usize, bytes: &[u8]) -> Result<Self> {
        let expected = width * height * 3;
        if bytes.len() != expected {
            return Err(Error::RasterSize {
                expected,
                actual: bytes.len(),
            });
        }
        let data = bytes
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Builds a raster from a pixel vector.
    pub fn from_pixels(width: usize, height: usize, data: Vec<Rgb>) -> Result<Self> {
        if data.len() != width * height {
            return Err(Error::RasterSize {
                expected: width * height * 3,
                actual: data.len() * 3,
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the pixels in row-major order.
    pub fn pixels(&self) -> &[Rgb] {
        &self.data
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgb] {
        &mut self.data
    }

    /// Gets a pixel at the given coordinates.
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x < self.width && y < self.height {
            Some(self.data[y * self.width + x])
        } else {
            None
        }
    }

    /// Sets a pixel at the given coordinates. Out of bounds writes are ignored.
    pub fn set_pixel(&mut self, x: usize, y: usize, rgb: Rgb) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = rgb;
        }
    }

    /// Fills a rectangle, clipped to the raster.
    pub fn fill_rect(&mut self, x: usize, y: usize, width: usize, height: usize, rgb: Rgb) {
        for py in y..(y + height).min(self.height) {
            for px in x..(x + width).min(self.width) {
                self.data[py * self.width + px] = rgb;
            }
        }
    }

    /// Converts the raster to RGB8 bytes for image encoding.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.data.iter().flatten().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgb8() {
        let raster = Raster::from_rgb8(2, 1, &[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(raster.get_pixel(0, 0), Some([1, 2, 3]));
        assert_eq!(raster.get_pixel(1, 0), Some([4, 5, 6]));
        assert_eq!(raster.get_pixel(2, 0), None);
        assert_eq!(raster.to_rgb8(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_from_rgb8_size_mismatch() {
        let err = Raster::from_rgb8(2, 2, &[0; 11]).unwrap_err();
        assert!(matches!(
            err,
            Error::RasterSize {
                expected: 12,
                actual: 11
            }
        ));
    }

    #[test]
    fn test_raster_ops() {
        let mut raster = Raster::panel();
        assert_eq!(raster.width(), 800);
        assert_eq!(raster.height(), 480);
        assert_eq!(raster.len(), 384_000);

        raster.set_pixel(10, 20, [255, 0, 0]);
        assert_eq!(raster.get_pixel(10, 20), Some([255, 0, 0]));

        raster.fill_rect(795, 475, 10, 10, [0, 0, 255]);
        assert_eq!(raster.get_pixel(799, 479), Some([0, 0, 255]));
        assert_eq!(raster.get_pixel(794, 479), Some([0, 0, 0]));
    }
}
