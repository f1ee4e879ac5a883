use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};

use crate::error::{AppError, AppResult};
use crate::raster::{Bitmap, ChannelOrder};

/// Encodes an RGBA bitmap as an 8-bit RGB PNG. Alpha is dropped and row
/// padding never reaches the output.
pub fn encode_png(bitmap: &Bitmap, compression: CompressionType) -> AppResult<Vec<u8>> {
    if bitmap.order() != ChannelOrder::Rgba {
        return Err(AppError::invalid_input(
            "png encoder expects pixels in RGBA order",
        ));
    }

    let rgb = pack_rgb(bitmap)?;
    let mut out = Vec::new();
    PngEncoder::new_with_quality(&mut out, compression, FilterType::Adaptive).write_image(
        &rgb,
        bitmap.width(),
        bitmap.height(),
        ExtendedColorType::Rgb8,
    )?;

    if out.is_empty() {
        return Err(AppError::resource_exhaustion(
            "png encoder produced no output",
        ));
    }
    Ok(out)
}

fn pack_rgb(bitmap: &Bitmap) -> AppResult<Vec<u8>> {
    let len = (bitmap.pixel_count() as usize)
        .checked_mul(3)
        .ok_or_else(|| AppError::resource_exhaustion("rgb buffer size overflows"))?;
    let mut rgb = Vec::new();
    rgb.try_reserve_exact(len)
        .map_err(|_| AppError::resource_exhaustion(format!("cannot allocate {len} byte rgb buffer")))?;

    for row in bitmap.rows() {
        for px in bytemuck::cast_slice::<u8, [u8; 4]>(row) {
            rgb.extend_from_slice(&px[..3]);
        }
    }
    Ok(rgb)
}
