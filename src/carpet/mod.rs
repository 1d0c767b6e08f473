//! Rug silhouettes: round rugs seen at an angle and trapezoidal runners.

mod ellipse;
mod trapezoid;

pub use ellipse::{binary_moment_centroid, circle_crop, visible_centroid, EllipseSynthesizer};
pub use trapezoid::TrapezoidSynthesizer;

use crate::config::OverlayConfig;
use crate::error::OverlayError;
use crate::types::{Centroid, OverlayMode};
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};

/// Carpet shape after perspective synthesis
#[derive(Debug, Clone)]
pub struct Silhouette {
    /// Carpet on black; transparent pixels flattened to (0, 0, 0)
    pub image: RgbImage,
    /// The same shape with its alpha channel, when the shape has one
    pub rgba: Option<RgbaImage>,
    /// Centre of the visible region, when the shape computes one
    pub centroid: Option<Centroid>,
}

impl Silhouette {
    /// Centre of the visible region: alpha when present, non-black pixels otherwise
    pub fn visible_center(&self) -> Centroid {
        match &self.rgba {
            Some(rgba) => visible_centroid(rgba),
            None => binary_moment_centroid(&self.image),
        }
    }
}

/// Turns a rectangular carpet texture into a placed-rug silhouette
pub trait ShapeSynthesizer: Send + Sync {
    fn synthesize(&self, carpet: &DynamicImage) -> Result<Silhouette, OverlayError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Synthesizer for a carpet mode, `None` for floor tiling
pub fn synthesizer_for(
    mode: OverlayMode,
    config: &OverlayConfig,
) -> Option<Box<dyn ShapeSynthesizer>> {
    match mode {
        OverlayMode::Floor => None,
        OverlayMode::CarpetEllipse => Some(Box::new(EllipseSynthesizer {
            squash_ratio: config.ellipse_squash,
            shift_ratio: config.ellipse_shift,
        })),
        OverlayMode::CarpetTrapezoid => Some(Box::new(TrapezoidSynthesizer)),
    }
}

/// Drop alpha, painting every fully transparent pixel black
pub fn flatten_to_black(rgba: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        if a == 0 {
            Rgb([0, 0, 0])
        } else {
            Rgb([r, g, b])
        }
    })
}

pub(crate) fn ensure_not_empty(carpet: &DynamicImage) -> Result<(), OverlayError> {
    if carpet.width() == 0 || carpet.height() == 0 {
        return Err(OverlayError::UnreadableImage(format!(
            "carpet image is {}x{}",
            carpet.width(),
            carpet.height()
        )));
    }
    Ok(())
}
