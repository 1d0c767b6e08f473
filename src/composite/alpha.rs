use super::kernels::gaussian_kernel_1d;
use crate::error::OverlayError;
use crate::tiler::luma;
use crate::types::{AlphaChannel, BinaryMask};
use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use imageproc::filter::separable_filter_equal;
use imageproc::region_labelling::{connected_components, Connectivity};
use std::collections::HashSet;

/// Separable gaussian blur of a single channel image.
///
/// Even kernel sizes are bumped to the next odd size; the border is
/// replicated. Filtering runs in `f32` and rounds once at the end.
pub fn gaussian_blur(src: &GrayImage, kernel_size: u32) -> GrayImage {
    if src.width() == 0 || src.height() == 0 {
        return src.clone();
    }

    let kernel = gaussian_kernel_1d((kernel_size | 1) as usize, 0.0);
    let float: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(src.width(), src.height(), |x, y| {
            Luma([src.get_pixel(x, y)[0] as f32])
        });
    let blurred = separable_filter_equal(&float, &kernel);

    GrayImage::from_fn(src.width(), src.height(), |x, y| {
        Luma([blurred.get_pixel(x, y)[0].round().clamp(0.0, 255.0) as u8])
    })
}

/// Feathered blend weights from a hard mask
pub fn feathered_alpha(mask: &BinaryMask, kernel_size: u32) -> AlphaChannel {
    let _span = tracing::debug_span!("feathered_alpha").entered();
    gaussian_blur(mask, kernel_size)
}

/// Lightly blur, then keep everything above 1.
///
/// The pre-blur closes pinholes and grows the mask by a pixel or two so that
/// later feathering starts just outside the visible edge.
pub fn smooth_threshold(gray: &GrayImage, kernel_size: u32) -> BinaryMask {
    let mut binary = gaussian_blur(gray, kernel_size);
    binary
        .pixels_mut()
        .for_each(|p| p[0] = if p[0] > 1 { 255 } else { 0 });
    binary
}

/// Set every background pixel not 4-connected to the image border
pub fn fill_holes(mask: &BinaryMask) -> BinaryMask {
    let (width, height) = mask.dimensions();
    if width == 0 || height == 0 {
        return mask.clone();
    }

    let background = GrayImage::from_fn(width, height, |x, y| {
        Luma([if mask.get_pixel(x, y)[0] == 0 { 255 } else { 0 }])
    });
    let regions = connected_components(&background, Connectivity::Four, Luma([0]));

    let border = (0..width)
        .flat_map(|x| [(x, 0), (x, height - 1)])
        .chain((0..height).flat_map(|y| [(0, y), (width - 1, y)]));
    let outside: HashSet<u32> = border
        .map(|(x, y)| regions.get_pixel(x, y)[0])
        .filter(|&label| label != 0)
        .collect();

    GrayImage::from_fn(width, height, |x, y| {
        let label = regions.get_pixel(x, y)[0];
        if label != 0 && outside.contains(&label) {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

/// Footprint of a layer drawn on black, holes included.
///
/// Black regions enclosed by the carpet are part of the carpet; only black
/// connected to the canvas border counts as background.
pub fn binary_silhouette(layer: &RgbImage, kernel_size: u32) -> BinaryMask {
    let gray = GrayImage::from_fn(layer.width(), layer.height(), |x, y| {
        Luma([luma(layer.get_pixel(x, y))])
    });
    fill_holes(&smooth_threshold(&gray, kernel_size))
}

/// Pixelwise AND of two masks
pub fn intersect(a: &BinaryMask, b: &BinaryMask) -> Result<BinaryMask, OverlayError> {
    OverlayError::check_dimensions(a.dimensions(), b.dimensions())?;
    Ok(GrayImage::from_fn(a.width(), a.height(), |x, y| {
        Luma([a.get_pixel(x, y)[0] & b.get_pixel(x, y)[0]])
    }))
}
