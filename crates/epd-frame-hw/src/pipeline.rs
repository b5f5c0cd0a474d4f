//! End-to-end conversion from a decoded raster to a panel buffer.

use tracing::debug;

use crate::dither::Dither;
use crate::orientation::Orientation;
use crate::packer::{pack, unpack};
use crate::raster::Raster;
use crate::{Result, EPD_HEIGHT, EPD_WIDTH, PACKED_LEN};

/// Normalizes orientation, dithers and packs a raster.
///
/// The result is always [`PACKED_LEN`] bytes, ready for
/// [`DeviceSession::display`](crate::DeviceSession::display) or transport.
pub fn prepare(raster: Raster, dither: Dither) -> Result<Vec<u8>> {
    let orientation = Orientation::detect(raster.width(), raster.height())?;
    let mut raster = Orientation::normalize(raster)?;
    dither.apply(&mut raster);
    let packed = pack(&raster)?;
    debug!(
        "Prepared {} raster with {} ({} bytes)",
        orientation,
        dither,
        packed.len()
    );
    Ok(packed)
}

/// Renders a packed buffer back to a landscape raster for previews.
pub fn preview(packed: &[u8]) -> Result<Raster> {
    crate::packer::validate_len(packed)?;
    let pixels = unpack(packed)?.into_iter().map(|c| c.rgb()).collect();
    Raster::from_pixels(EPD_WIDTH, EPD_HEIGHT, pixels)
}
