use crate::types::BinaryMask;
use anyhow::{bail, Result};
use image::{imageops, GrayImage, Luma, RgbImage};
use ndarray::{Array4, ArrayView4};

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Preprocessor for converting RGB photos to model input tensors
pub struct Preprocessor {
    target_width: u32,
    target_height: u32,
}

impl Preprocessor {
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
        }
    }

    /// Preprocess an RGB photo into a normalized NCHW tensor
    ///
    /// Steps:
    /// 1. Resize to target dimensions
    /// 2. Scale to [0, 1] and apply ImageNet mean/std
    /// 3. Transpose from HWC to NCHW format
    ///
    /// Returns: Array4<f32> with shape [1, 3, height, width]
    pub fn preprocess(&self, photo: &RgbImage) -> Result<Array4<f32>> {
        let _span = tracing::debug_span!("preprocess").entered();

        let resized = if photo.dimensions() != (self.target_width, self.target_height) {
            imageops::resize(
                photo,
                self.target_width,
                self.target_height,
                imageops::FilterType::Triangle,
            )
        } else {
            photo.clone()
        };

        let (width, height) = resized.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                let value = pixel[c] as f32 / 255.0;
                tensor[[0, c, y as usize, x as usize]] =
                    (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            }
        }

        Ok(tensor)
    }

    /// Reduce class logits of shape [1, classes, h, w] to a per-pixel label map
    pub fn argmax_labels(logits: ArrayView4<'_, f32>) -> Result<(Vec<u32>, u32, u32)> {
        let _span = tracing::debug_span!("argmax").entered();

        let (batch, classes, height, width) = logits.dim();
        if batch != 1 || classes == 0 {
            bail!("Unexpected logits shape {:?}", logits.shape());
        }

        let mut labels = Vec::with_capacity(height * width);
        for y in 0..height {
            for x in 0..width {
                let mut best = 0;
                for c in 1..classes {
                    if logits[[0, c, y, x]] > logits[[0, best, y, x]] {
                        best = c;
                    }
                }
                labels.push(best as u32);
            }
        }

        Ok((labels, width as u32, height as u32))
    }

    /// Turn a label map into a binary mask for one class at photo resolution
    ///
    /// Returns `None` when the class has no pixel. Resizing is nearest-neighbour
    /// so the mask stays two-level.
    pub fn labels_to_mask(
        labels: &[u32],
        label_width: u32,
        label_height: u32,
        class_id: u32,
        target_width: u32,
        target_height: u32,
    ) -> Option<BinaryMask> {
        let _span = tracing::debug_span!("postprocess").entered();

        if !labels.contains(&class_id) {
            return None;
        }

        let mask = GrayImage::from_fn(label_width, label_height, |x, y| {
            let idx = (y * label_width + x) as usize;
            if labels[idx] == class_id {
                Luma([255])
            } else {
                Luma([0])
            }
        });

        if mask.dimensions() == (target_width, target_height) {
            return Some(mask);
        }

        Some(imageops::resize(
            &mask,
            target_width,
            target_height,
            imageops::FilterType::Nearest,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn preprocess_shape_and_normalization() -> Result<()> {
        let photo = RgbImage::from_pixel(16, 16, image::Rgb([255, 0, 124]));
        let tensor = Preprocessor::new(16, 16).preprocess(&photo)?;
        assert_eq!(tensor.shape(), &[1, 3, 16, 16]);
        let resized = Preprocessor::new(32, 8).preprocess(&photo)?;
        assert_eq!(resized.shape(), &[1, 3, 8, 32]);
        assert_relative_eq!(tensor[[0, 0, 3, 3]], (1.0 - 0.485) / 0.229, epsilon = 1e-5);
        assert_relative_eq!(tensor[[0, 1, 3, 3]], -0.456 / 0.224, epsilon = 1e-5);
        Ok(())
    }

    #[test]
    fn argmax_picks_highest_logit() -> Result<()> {
        let mut logits = Array4::<f32>::zeros((1, 4, 1, 2));
        logits[[0, 3, 0, 0]] = 2.0;
        logits[[0, 1, 0, 1]] = 0.5;
        let (labels, w, h) = Preprocessor::argmax_labels(logits.view())?;
        assert_eq!((w, h), (2, 1));
        assert_eq!(labels, vec![3, 1]);
        Ok(())
    }

    #[test]
    fn labels_to_mask_resizes_and_reports_absence() {
        let labels = vec![3, 0, 0, 3];
        let mask = Preprocessor::labels_to_mask(&labels, 2, 2, 3, 4, 4).unwrap();
        assert_eq!(mask.dimensions(), (4, 4));
        assert_eq!(mask.get_pixel(0, 0)[0], 255);
        assert_eq!(mask.get_pixel(3, 0)[0], 0);
        assert_eq!(mask.get_pixel(3, 3)[0], 255);
        assert!(Preprocessor::labels_to_mask(&labels, 2, 2, 7, 4, 4).is_none());
    }
}
