#[cfg(feature = "onnx")]
mod onnx;
mod precomputed;
#[cfg(feature = "onnx")]
mod preprocess;
pub mod types;

#[cfg(feature = "onnx")]
pub use onnx::OnnxSegmenter;
pub use precomputed::{LabelMap, PrecomputedMask};
#[cfg(feature = "onnx")]
pub use preprocess::Preprocessor;
pub use types::SegmentationModel;
