use super::{ensure_not_empty, flatten_to_black, ShapeSynthesizer, Silhouette};
use crate::error::OverlayError;
use crate::geometry::{pixel_centroid, Homography};
use crate::tiler::luma;
use crate::types::Centroid;
use image::{DynamicImage, GrayImage, Luma, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_circle_mut;
use imageproc::geometric_transformations::{warp_into, Interpolation};

/// Round rug tilted away from the camera.
///
/// The texture is cut to its inscribed circle, then the top and bottom are
/// pulled in and the top edge narrowed so the circle reads as an ellipse on
/// the floor.
#[derive(Debug, Clone, Copy)]
pub struct EllipseSynthesizer {
    /// Vertical squash, as a fraction of height
    pub squash_ratio: f32,
    /// Horizontal lean of the top edge, as a fraction of width
    pub shift_ratio: f32,
}

impl Default for EllipseSynthesizer {
    fn default() -> Self {
        Self {
            squash_ratio: 0.3,
            shift_ratio: 0.2,
        }
    }
}

impl ShapeSynthesizer for EllipseSynthesizer {
    fn synthesize(&self, carpet: &DynamicImage) -> Result<Silhouette, OverlayError> {
        let _span = tracing::debug_span!("ellipse_silhouette").entered();

        let circle = circle_crop(carpet)?;
        let (width, height) = circle.dimensions();
        let (w, h) = (width as f32, height as f32);
        let squash = h * self.squash_ratio;
        let shift = w * self.shift_ratio;

        let dst = [
            (shift, squash),
            (w - shift, squash),
            (w, h - squash),
            (0.0, h - squash),
        ];
        let projection = *Homography::from_rect(width, height, &dst)?.projection();

        let mut warped = RgbaImage::new(width, height);
        warp_into(
            &circle,
            &projection,
            Interpolation::Bilinear,
            Rgba([0, 0, 0, 0]),
            &mut warped,
        );

        let centroid = visible_centroid(&warped);
        tracing::debug!("Ellipse silhouette {}x{}, centre {}", width, height, centroid);

        Ok(Silhouette {
            image: flatten_to_black(&warped),
            rgba: Some(warped),
            centroid: Some(centroid),
        })
    }

    fn name(&self) -> &'static str {
        "ellipse"
    }
}

/// Cut the carpet to its inscribed circle.
///
/// The circle has radius `min(w, h) / 2` around the image centre; the
/// result is cropped to the circle's bounding square. Pixels outside the
/// circle are transparent black.
pub fn circle_crop(carpet: &DynamicImage) -> Result<RgbaImage, OverlayError> {
    ensure_not_empty(carpet)?;

    let rgba = carpet.to_rgba8();
    let (width, height) = rgba.dimensions();
    let radius = width.min(height) / 2;
    if radius == 0 {
        return Err(OverlayError::DegenerateGeometry(format!(
            "carpet {}x{} is too small for a circle",
            width, height
        )));
    }
    let (cx, cy) = (width / 2, height / 2);

    let mut mask = GrayImage::new(width, height);
    draw_filled_circle_mut(&mut mask, (cx as i32, cy as i32), radius as i32, Luma([255]));

    let (x0, y0) = (cx - radius, cy - radius);
    let side = 2 * radius;
    Ok(RgbaImage::from_fn(side, side, |x, y| {
        let (sx, sy) = (x0 + x, y0 + y);
        let alpha = mask.get_pixel(sx, sy)[0];
        if alpha == 0 {
            Rgba([0, 0, 0, 0])
        } else {
            let [r, g, b, _] = rgba.get_pixel(sx, sy).0;
            Rgba([r, g, b, alpha])
        }
    }))
}

/// Mean position of pixels with non-zero alpha; image centre if none
pub fn visible_centroid(rgba: &RgbaImage) -> Centroid {
    let alpha = GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        Luma([rgba.get_pixel(x, y)[3]])
    });
    pixel_centroid(&alpha).unwrap_or_else(|| geometric_center(rgba.width(), rgba.height()))
}

/// Centroid of `luma > 1` for images without alpha; image centre if none
pub fn binary_moment_centroid(rgb: &RgbImage) -> Centroid {
    let binary = GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        if luma(rgb.get_pixel(x, y)) > 1 {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    pixel_centroid(&binary).unwrap_or_else(|| geometric_center(rgb.width(), rgb.height()))
}

fn geometric_center(width: u32, height: u32) -> Centroid {
    Centroid::new((width / 2) as i32, (height / 2) as i32)
}
