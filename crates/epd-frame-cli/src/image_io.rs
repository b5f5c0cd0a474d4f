//! Image decoding, fitting and PNG output.

use anyhow::{Context, Result};
use epd_frame_hw::packer::validate_len;
use epd_frame_hw::{Orientation, Raster};
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageReader, RgbImage};
use std::path::Path;
use tracing::{debug, info};

/// Decodes an image file into a raster, honouring EXIF orientation.
///
/// With `fit`, images that are not already panel sized are scaled to cover
/// the panel and center-cropped.
pub fn load_raster(path: &Path, fit: bool) -> Result<Raster> {
    let mut decoder = ImageReader::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?
        .with_guessed_format()?
        .into_decoder()
        .with_context(|| format!("Unsupported image format: {}", path.display()))?;
    let orientation = decoder.orientation()?;
    let mut img = DynamicImage::from_decoder(decoder).context("Failed to decode image")?;
    img.apply_orientation(orientation);
    info!(
        "Opened {} ({}x{})",
        path.display(),
        img.width(),
        img.height()
    );

    let img = if fit { fit_panel(img) } else { img };
    to_raster(&img.into_rgb8())
}

/// Scales and crops an image to the panel in its closer orientation:
/// landscape if wider than tall, portrait otherwise.
pub fn fit_panel(img: DynamicImage) -> DynamicImage {
    let (width, height) = (img.width(), img.height());
    let target = if width > height {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    };
    let (target_w, target_h) = target.dimensions();
    if (width as usize, height as usize) == (target_w, target_h) {
        return img;
    }

    debug!(
        "Fitting {}x{} to {} {}x{}",
        width, height, target, target_w, target_h
    );
    img.resize_to_fill(target_w as u32, target_h as u32, FilterType::Lanczos3)
}

pub fn to_raster(img: &RgbImage) -> Result<Raster> {
    Ok(Raster::from_rgb8(
        img.width() as usize,
        img.height() as usize,
        img.as_raw(),
    )?)
}

pub fn save_png(raster: &Raster, path: &Path) -> Result<()> {
    let img = RgbImage::from_raw(
        raster.width() as u32,
        raster.height() as u32,
        raster.to_rgb8(),
    )
    .context("Raster does not fill the image buffer")?;
    img.save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote preview to {}", path.display());
    Ok(())
}

/// Reads an already packed panel buffer.
pub fn read_packed(path: &Path) -> Result<Vec<u8>> {
    let packed =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    validate_len(&packed).with_context(|| format!("{} is not a panel buffer", path.display()))?;
    Ok(packed)
}
