//! One overlay request end to end: segment, then tile the floor or place a rug.

use crate::carpet::{synthesizer_for, ShapeSynthesizer};
use crate::composite::{
    binary_silhouette, feathered_alpha, hard_stencil, intersect, smooth_threshold, soft_blend,
    transparent_output,
};
use crate::config::OverlayConfig;
use crate::error::{OverlayError, PipelineError, Stage, StageContext};
use crate::geometry::{extract_floor_quad, Quad};
use crate::placement::{
    floor_anchor, mark_center, paint_floor_marker, place_on_canvas, scale_to_box, target_box,
};
use crate::segmentation::SegmentationModel;
use crate::tiler::tile_floor;
use crate::types::{BinaryMask, Centroid, OverlayMode};
use image::{DynamicImage, RgbImage, RgbaImage};

/// Inputs of a single overlay
#[derive(Debug, Clone)]
pub struct OverlayRequest {
    /// Room photograph
    pub room: RgbImage,
    /// Floor tile or carpet picture
    pub texture: DynamicImage,
    pub mode: OverlayMode,
    /// Physical carpet size such as `"13/9"`; ignored in floor mode
    pub carpet_dimensions: Option<String>,
}

impl OverlayRequest {
    pub fn new(room: RgbImage, texture: DynamicImage, mode: OverlayMode) -> Self {
        Self {
            room,
            texture,
            mode,
            carpet_dimensions: None,
        }
    }

    pub fn with_carpet_dimensions(mut self, dimensions: impl Into<String>) -> Self {
        self.carpet_dimensions = Some(dimensions.into());
        self
    }
}

/// Intermediate images, kept for inspection
#[derive(Debug, Clone, Default)]
pub struct Artifacts {
    /// Floor mask as returned by segmentation
    pub floor_mask: Option<BinaryMask>,
    /// Texture warped over the whole canvas (floor mode)
    pub warped_texture: Option<RgbImage>,
    /// Red floor marker with the detected centre drawn in green (carpet modes)
    pub marked_floor: Option<RgbImage>,
    /// Scaled carpet placed on a black room-sized canvas (carpet modes)
    pub carpet_canvas: Option<RgbImage>,
    /// Binary carpet silhouette on the canvas (carpet modes)
    pub silhouette: Option<BinaryMask>,
}

/// Result of a successful overlay
#[derive(Debug, Clone)]
pub struct Overlay {
    /// Room with the texture applied, same size as the room
    pub composite: RgbImage,
    /// Carpet alone with feathered alpha (carpet modes)
    pub transparent: Option<RgbaImage>,
    /// Floor corners the texture was mapped onto (floor mode)
    pub quad: Option<Quad>,
    /// Floor centre the carpet was anchored at (carpet modes)
    pub anchor: Option<Centroid>,
    /// Centre of the synthesized silhouette, in the silhouette's own pixels
    pub silhouette_centroid: Option<Centroid>,
    pub artifacts: Artifacts,
}

/// Runs overlays against a shared segmentation model
pub struct Overlayer<'m> {
    model: &'m dyn SegmentationModel,
    config: OverlayConfig,
}

impl<'m> Overlayer<'m> {
    pub fn new(model: &'m dyn SegmentationModel, config: OverlayConfig) -> Self {
        Self { model, config }
    }

    /// Run one request. Either every stage succeeds or nothing is returned.
    pub fn run(&self, request: &OverlayRequest) -> Result<Overlay, PipelineError> {
        let _span = tracing::debug_span!("overlay", mode = %request.mode).entered();
        tracing::info!(
            "Overlaying {} on {}x{} room",
            request.mode,
            request.room.width(),
            request.room.height()
        );

        let mask = self.segment(&request.room).stage(Stage::Segmentation)?;

        match synthesizer_for(request.mode, &self.config) {
            None => self.overlay_floor(request, mask),
            Some(synthesizer) => self.overlay_carpet(request, mask, synthesizer.as_ref()),
        }
    }

    fn segment(&self, room: &RgbImage) -> Result<BinaryMask, OverlayError> {
        let _span = tracing::debug_span!("segment").entered();

        if room.width() == 0 || room.height() == 0 {
            return Err(OverlayError::UnreadableImage("room image is empty".to_string()));
        }

        let mask = self
            .model
            .segment(room, self.config.floor_class_id)
            .map_err(OverlayError::Segmentation)?
            .ok_or(OverlayError::NoFloorDetected)?;
        OverlayError::check_dimensions(room.dimensions(), mask.dimensions())?;
        Ok(mask)
    }

    fn overlay_floor(
        &self,
        request: &OverlayRequest,
        mask: BinaryMask,
    ) -> Result<Overlay, PipelineError> {
        let geometry =
            extract_floor_quad(&mask, self.config.mask_threshold).stage(Stage::MaskGeometry)?;
        tracing::debug!("Floor corners: {:?}", geometry.quad);

        let warped = tile_floor(
            &request.texture.to_rgb8(),
            &geometry.quad,
            &geometry.mask,
            self.config.gap_luma,
        )
        .stage(Stage::Tiling)?;

        let composite =
            hard_stencil(&request.room, &warped, &geometry.mask).stage(Stage::Compositing)?;

        Ok(Overlay {
            composite,
            transparent: None,
            quad: Some(geometry.quad),
            anchor: None,
            silhouette_centroid: None,
            artifacts: Artifacts {
                floor_mask: Some(mask),
                warped_texture: Some(warped),
                ..Artifacts::default()
            },
        })
    }

    fn overlay_carpet(
        &self,
        request: &OverlayRequest,
        mask: BinaryMask,
        synthesizer: &dyn ShapeSynthesizer,
    ) -> Result<Overlay, PipelineError> {
        let (width, height) = request.room.dimensions();

        tracing::debug!("Synthesizing {} silhouette", synthesizer.name());
        let silhouette = synthesizer
            .synthesize(&request.texture)
            .stage(Stage::Silhouette)?;

        let bounds = target_box(width, height, request.carpet_dimensions.as_deref());
        let scaled = scale_to_box(&silhouette.image, bounds);

        let anchor = floor_anchor(&mask).stage(Stage::Placement)?;
        tracing::info!("Anchoring carpet at floor centre {}", anchor);
        let canvas = place_on_canvas(&scaled, width, height, anchor);

        let kernel = self.config.silhouette_kernel;
        let room_mask = smooth_threshold(&mask, kernel);
        let carpet_mask = binary_silhouette(&canvas, kernel);
        let on_floor = intersect(&room_mask, &carpet_mask).stage(Stage::Compositing)?;

        let alpha = feathered_alpha(&on_floor, self.config.feather_kernel);
        let composite = soft_blend(&request.room, &canvas, &alpha).stage(Stage::Compositing)?;

        let carpet_alpha = feathered_alpha(&carpet_mask, self.config.feather_kernel);
        let transparent =
            transparent_output(&canvas, &carpet_mask, &carpet_alpha).stage(Stage::Compositing)?;

        Ok(Overlay {
            composite,
            transparent: Some(transparent),
            quad: None,
            anchor: Some(anchor),
            silhouette_centroid: silhouette.centroid,
            artifacts: Artifacts {
                floor_mask: Some(mask.clone()),
                warped_texture: None,
                marked_floor: Some(mark_center(&paint_floor_marker(&mask), anchor)),
                carpet_canvas: Some(canvas),
                silhouette: Some(carpet_mask),
            },
        })
    }
}
