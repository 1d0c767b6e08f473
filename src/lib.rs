//! Place floor tiles and rugs onto room photographs.
//!
//! The floor region comes from an external [`SegmentationModel`]; everything
//! after that (corner recovery, homography tiling, rug synthesis, anchoring
//! and blending) happens in memory on `image` buffers.

pub mod carpet;
pub mod composite;
pub mod config;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod placement;
pub mod segmentation;
pub mod tiler;
pub mod types;

pub use config::{OverlayConfig, FLOOR_CLASS_ID};
pub use error::{OverlayError, PipelineError, Stage};
pub use geometry::{Homography, Quad};
pub use pipeline::{Artifacts, Overlay, OverlayRequest, Overlayer};
pub use segmentation::{LabelMap, PrecomputedMask, SegmentationModel};
pub use types::{AlphaChannel, BinaryMask, Centroid, OverlayMode};
