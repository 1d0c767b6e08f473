use super::{ensure_not_empty, ShapeSynthesizer, Silhouette};
use crate::error::OverlayError;
use crate::geometry::Homography;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation};

/// Rectangular rug seen from a few feet away: the far (top) edge is pulled
/// in by a third of the height on each side, the near edge stays put.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrapezoidSynthesizer;

impl ShapeSynthesizer for TrapezoidSynthesizer {
    fn synthesize(&self, carpet: &DynamicImage) -> Result<Silhouette, OverlayError> {
        let _span = tracing::debug_span!("trapezoid_silhouette").entered();
        ensure_not_empty(carpet)?;

        let rgb = carpet.to_rgb8();
        let (width, height) = rgb.dimensions();
        let (w, h) = (width as f32, height as f32);
        let offset = (height / 3) as f32;

        let dst = [(offset, 0.0), (w - offset, 0.0), (w, h), (0.0, h)];
        let projection = *Homography::from_rect(width, height, &dst)?.projection();

        let mut warped = RgbImage::new(width, height);
        warp_into(
            &rgb,
            &projection,
            Interpolation::Bilinear,
            Rgb([0, 0, 0]),
            &mut warped,
        );
        tracing::debug!("Trapezoid silhouette {}x{}, top inset {}", width, height, offset);

        Ok(Silhouette {
            image: warped,
            rgba: None,
            centroid: None,
        })
    }

    fn name(&self) -> &'static str {
        "trapezoid"
    }
}
