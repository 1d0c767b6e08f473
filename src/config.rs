/// ADE20K class index for "floor"
pub const FLOOR_CLASS_ID: u32 = 3;

/// Tunables shared by all overlay modes
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Segmentation class that marks the floor
    pub floor_class_id: u32,
    /// Mask values above this are floor
    pub mask_threshold: u8,
    /// Gaussian kernel size used to feather carpet edges (odd)
    pub feather_kernel: u32,
    /// Gaussian kernel size applied before binarizing a carpet canvas (odd)
    pub silhouette_kernel: u32,
    /// Luma below this inside the floor counts as a coverage gap
    pub gap_luma: u8,
    /// Vertical squash of the ellipse warp, relative to height
    pub ellipse_squash: f32,
    /// Horizontal lean of the ellipse warp, relative to width
    pub ellipse_shift: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            floor_class_id: FLOOR_CLASS_ID,
            mask_threshold: 40,
            feather_kernel: 15,
            silhouette_kernel: 5,
            gap_luma: 5,
            ellipse_squash: 0.3,
            ellipse_shift: 0.2,
        }
    }
}
