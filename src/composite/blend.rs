use crate::error::OverlayError;
use crate::types::{AlphaChannel, BinaryMask};
use image::{GrayImage, RgbImage, RgbaImage};
use rayon::prelude::*;

fn check_same_size(room: &RgbImage, layer: &RgbImage, mask: &GrayImage) -> Result<(), OverlayError> {
    OverlayError::check_dimensions(room.dimensions(), layer.dimensions())?;
    OverlayError::check_dimensions(room.dimensions(), mask.dimensions())
}

/// `layer` where the mask is 255, the untouched room everywhere else
pub fn hard_stencil(
    room: &RgbImage,
    layer: &RgbImage,
    mask: &BinaryMask,
) -> Result<RgbImage, OverlayError> {
    check_same_size(room, layer, mask)?;
    let _span = tracing::debug_span!("hard_stencil").entered();

    let width = room.width() as usize;
    let mut out = room.clone();
    if width == 0 || room.height() == 0 {
        return Ok(out);
    }

    out.par_chunks_exact_mut(width * 3)
        .zip(layer.par_chunks_exact(width * 3))
        .zip(mask.par_chunks_exact(width))
        .for_each(|((out_row, layer_row), mask_row)| {
            for ((dst, src), m) in out_row
                .chunks_exact_mut(3)
                .zip(layer_row.chunks_exact(3))
                .zip(mask_row)
            {
                if *m == 255 {
                    dst.copy_from_slice(src);
                }
            }
        });
    Ok(out)
}

/// `layer·a + room·(1 - a)` with `a = alpha / 255`, rounded and clamped
pub fn soft_blend(
    room: &RgbImage,
    layer: &RgbImage,
    alpha: &AlphaChannel,
) -> Result<RgbImage, OverlayError> {
    check_same_size(room, layer, alpha)?;
    let _span = tracing::debug_span!("soft_blend").entered();

    let width = room.width() as usize;
    let mut out = RgbImage::new(room.width(), room.height());
    if width == 0 || room.height() == 0 {
        return Ok(out);
    }

    out.par_chunks_exact_mut(width * 3)
        .zip(room.par_chunks_exact(width * 3))
        .zip(layer.par_chunks_exact(width * 3))
        .zip(alpha.par_chunks_exact(width))
        .for_each(|(((out_row, room_row), layer_row), alpha_row)| {
            for (((dst, bg), fg), a) in out_row
                .chunks_exact_mut(3)
                .zip(room_row.chunks_exact(3))
                .zip(layer_row.chunks_exact(3))
                .zip(alpha_row)
            {
                let a = *a as f32 / 255.0;
                for c in 0..3 {
                    let value = fg[c] as f32 * a + bg[c] as f32 * (1.0 - a);
                    dst[c] = value.round().clamp(0.0, 255.0) as u8;
                }
            }
        });
    Ok(out)
}

/// Layer with its own feathered alpha, for rendering over any background.
///
/// Pure black pixels inside the un-blurred `binary` mask are carpet detail,
/// not background, and stay fully opaque whatever the feathering says.
pub fn transparent_output(
    layer: &RgbImage,
    binary: &BinaryMask,
    alpha: &AlphaChannel,
) -> Result<RgbaImage, OverlayError> {
    OverlayError::check_dimensions(layer.dimensions(), binary.dimensions())?;
    OverlayError::check_dimensions(layer.dimensions(), alpha.dimensions())?;
    let _span = tracing::debug_span!("transparent_output").entered();

    let width = layer.width() as usize;
    let mut out = RgbaImage::new(layer.width(), layer.height());
    if width == 0 || layer.height() == 0 {
        return Ok(out);
    }

    out.par_chunks_exact_mut(width * 4)
        .zip(layer.par_chunks_exact(width * 3))
        .zip(binary.par_chunks_exact(width))
        .zip(alpha.par_chunks_exact(width))
        .for_each(|(((out_row, layer_row), binary_row), alpha_row)| {
            for (((dst, rgb), inside), a) in out_row
                .chunks_exact_mut(4)
                .zip(layer_row.chunks_exact(3))
                .zip(binary_row)
                .zip(alpha_row)
            {
                dst[..3].copy_from_slice(rgb);
                let black = rgb == [0, 0, 0];
                dst[3] = if black && *inside == 255 { 255 } else { *a };
            }
        });
    Ok(out)
}
