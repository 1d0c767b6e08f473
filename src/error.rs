use std::fmt;
use thiserror::Error;

/// Failure of a single overlay stage
#[derive(Debug, Error)]
pub enum OverlayError {
    /// Segmentation found no floor, or the mask has no contour
    #[error("no floor detected in the room image")]
    NoFloorDetected,

    /// Input buffer missing, empty or not decodable
    #[error("unreadable image: {0}")]
    UnreadableImage(String),

    /// Zero-area polygon, flat hull or singular homography
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// The floor marker used to anchor a carpet is absent
    #[error("floor centre marker not found")]
    FloorCenterNotFound,

    /// Two layers that must overlap pixel-for-pixel do not
    #[error("dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// The external segmentation model failed
    #[error("segmentation failed: {0:#}")]
    Segmentation(anyhow::Error),
}

impl OverlayError {
    /// Fail with [`OverlayError::DimensionMismatch`] unless both sizes agree
    pub fn check_dimensions(expected: (u32, u32), actual: (u32, u32)) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(OverlayError::DimensionMismatch { expected, actual })
        }
    }
}

/// Pipeline stage names, reported with every failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Segmentation,
    MaskGeometry,
    Tiling,
    Silhouette,
    Placement,
    Compositing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Segmentation => "segmentation",
            Stage::MaskGeometry => "mask geometry",
            Stage::Tiling => "homography tiling",
            Stage::Silhouette => "silhouette synthesis",
            Stage::Placement => "placement",
            Stage::Compositing => "compositing",
        };
        f.write_str(name)
    }
}

/// Overlay-level failure: which stage failed and why
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: OverlayError,
}

/// Attach a [`Stage`] to a stage result
pub(crate) trait StageContext<T> {
    fn stage(self, stage: Stage) -> Result<T, PipelineError>;
}

impl<T> StageContext<T> for Result<T, OverlayError> {
    fn stage(self, stage: Stage) -> Result<T, PipelineError> {
        self.map_err(|source| PipelineError { stage, source })
    }
}
