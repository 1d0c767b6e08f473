use crate::types::BinaryMask;
use anyhow::Result;
use image::RgbImage;

/// Trait for segmentation models
/// Allows swapping between backends (ONNX, precomputed masks, test doubles)
///
/// Implementations are shared read-only between concurrent overlay requests.
pub trait SegmentationModel: Send + Sync {
    /// Classify a photo and return the pixels of one class
    ///
    /// # Arguments
    /// * `photo` - Input room photo
    /// * `class_id` - Class to extract (3 is "floor" in ADE20K)
    ///
    /// # Returns
    /// * `Some(mask)` with class pixels = 255, others = 0, same dimensions as `photo`
    /// * `None` when the class does not appear in the photo
    fn segment(&self, photo: &RgbImage, class_id: u32) -> Result<Option<BinaryMask>>;

    /// Get the model's preferred input dimensions
    ///
    /// Returns (width, height)
    fn input_size(&self) -> (u32, u32);
}
