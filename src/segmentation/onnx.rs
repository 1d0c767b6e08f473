use super::preprocess::Preprocessor;
use super::types::SegmentationModel;
use crate::types::BinaryMask;
use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use ndarray::Ix4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::TensorRef;
use std::path::Path;
use std::sync::Mutex;

/// Semantic segmentation model exported to ONNX (e.g. an ADE20K-trained network)
///
/// Expects one NCHW image input and class logits `[1, classes, h, w]` as the
/// first output. The session is stateless between photos; the mutex only
/// serializes access for concurrent requests.
pub struct OnnxSegmenter {
    session: Mutex<Session>,
    preprocessor: Preprocessor,
    width: u32,
    height: u32,
}

impl OnnxSegmenter {
    /// Create a new segmenter from an ONNX file
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX model file
    ///
    /// # Default Configuration
    /// - Input size: 512x512
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        Self::with_input_size(model_path, 512, 512)
    }

    pub fn with_input_size<P: AsRef<Path>>(model_path: P, width: u32, height: u32) -> Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading segmentation model from {}", path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        tracing::info!("Segmentation model loaded successfully");

        Ok(Self {
            session: Mutex::new(session),
            preprocessor: Preprocessor::new(width, height),
            width,
            height,
        })
    }
}

impl SegmentationModel for OnnxSegmenter {
    fn segment(&self, photo: &RgbImage, class_id: u32) -> Result<Option<BinaryMask>> {
        let _span = tracing::debug_span!("onnx_segment").entered();

        let input_tensor = self.preprocessor.preprocess(photo)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("Segmentation session lock poisoned"))?;

        let _infer_span = tracing::debug_span!("inference").entered();
        let outputs = session
            .run(ort::inputs![TensorRef::from_array_view(input_tensor.view())?])
            .context("Failed to run inference")?;
        drop(_infer_span);

        let logits = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract class logits")?
            .into_dimensionality::<Ix4>()
            .context("Class logits are not 4-dimensional")?;

        let (labels, label_width, label_height) = Preprocessor::argmax_labels(logits)?;
        tracing::debug!(
            "Segmented {}x{} label map, looking for class {}",
            label_width,
            label_height,
            class_id
        );

        Ok(Preprocessor::labels_to_mask(
            &labels,
            label_width,
            label_height,
            class_id,
            photo.width(),
            photo.height(),
        ))
    }

    fn input_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
