use super::types::SegmentationModel;
use crate::geometry::binarize;
use crate::types::BinaryMask;
use anyhow::{Context, Result};
use image::{imageops, GrayImage, Luma, RgbImage};
use std::path::Path;

/// Bring a mask to the photo's size; nearest-neighbour keeps it two-level
fn fit_to(mask: &GrayImage, photo: &RgbImage) -> GrayImage {
    if mask.dimensions() == photo.dimensions() {
        return mask.clone();
    }
    tracing::debug!(
        "Resizing mask {}x{} to photo {}x{}",
        mask.width(),
        mask.height(),
        photo.width(),
        photo.height()
    );
    imageops::resize(
        mask,
        photo.width(),
        photo.height(),
        imageops::FilterType::Nearest,
    )
}

fn non_empty(mask: BinaryMask) -> Option<BinaryMask> {
    mask.pixels().any(|p| p[0] > 0).then_some(mask)
}

/// A floor mask produced ahead of time, e.g. by an offline model run.
///
/// The class id is ignored: the mask already holds the single class of
/// interest. Values above the threshold count as that class.
#[derive(Debug, Clone)]
pub struct PrecomputedMask {
    mask: GrayImage,
    threshold: u8,
}

impl PrecomputedMask {
    pub fn new(mask: GrayImage) -> Self {
        Self { mask, threshold: 40 }
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    /// Load a mask image; colored masks are reduced to luma
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Loading floor mask from {}", path.display());
        let mask = image::open(path)
            .with_context(|| format!("Failed to read mask from {}", path.display()))?
            .to_luma8();
        Ok(Self::new(mask))
    }
}

impl SegmentationModel for PrecomputedMask {
    fn segment(&self, photo: &RgbImage, _class_id: u32) -> Result<Option<BinaryMask>> {
        let fitted = fit_to(&self.mask, photo);
        Ok(non_empty(binarize(&fitted, self.threshold)))
    }

    fn input_size(&self) -> (u32, u32) {
        self.mask.dimensions()
    }
}

/// Per-pixel class indices, one byte per pixel (ADE20K-style label PNG)
#[derive(Debug, Clone)]
pub struct LabelMap {
    labels: GrayImage,
}

impl LabelMap {
    pub fn new(labels: GrayImage) -> Self {
        Self { labels }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Loading label map from {}", path.display());
        let labels = image::open(path)
            .with_context(|| format!("Failed to read label map from {}", path.display()))?
            .to_luma8();
        Ok(Self::new(labels))
    }
}

impl SegmentationModel for LabelMap {
    fn segment(&self, photo: &RgbImage, class_id: u32) -> Result<Option<BinaryMask>> {
        let fitted = fit_to(&self.labels, photo);
        let mask = GrayImage::from_fn(fitted.width(), fitted.height(), |x, y| {
            if fitted.get_pixel(x, y)[0] as u32 == class_id {
                Luma([255])
            } else {
                Luma([0])
            }
        });
        Ok(non_empty(mask))
    }

    fn input_size(&self) -> (u32, u32) {
        self.labels.dimensions()
    }
}
