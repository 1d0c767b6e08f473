//! Projective texture tiling onto the floor quadrilateral.

use crate::error::OverlayError;
use crate::geometry::{Homography, Quad};
use crate::types::BinaryMask;
use image::{imageops, GrayImage, Luma, Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation};

/// BT.601 luma, the weighting used for all grayscale decisions
pub(crate) fn luma(pixel: &Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0;
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000) as u8
}

/// Replicate the texture into a 2×2 grid
pub fn tile_2x2(texture: &RgbImage) -> RgbImage {
    let (width, height) = texture.dimensions();
    let mut tiled = RgbImage::new(width * 2, height * 2);
    imageops::tile(&mut tiled, texture);
    tiled
}

/// Warp the whole texture rectangle onto `quad` on a black canvas of the given size
pub fn warp_onto_quad(
    texture: &RgbImage,
    quad: &Quad,
    width: u32,
    height: u32,
) -> Result<RgbImage, OverlayError> {
    let _span = tracing::debug_span!("warp_onto_quad").entered();

    let homography = Homography::from_rect(texture.width(), texture.height(), &quad.to_f32())?;

    let mut warped = RgbImage::new(width, height);
    warp_into(
        texture,
        homography.projection(),
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
        &mut warped,
    );
    Ok(warped)
}

/// Floor pixels the warp left (nearly) black
pub fn coverage_gaps(
    warped: &RgbImage,
    floor_mask: &BinaryMask,
    gap_luma: u8,
) -> Result<BinaryMask, OverlayError> {
    OverlayError::check_dimensions(floor_mask.dimensions(), warped.dimensions())?;

    Ok(GrayImage::from_fn(warped.width(), warped.height(), |x, y| {
        let uncovered = luma(warped.get_pixel(x, y)) < gap_luma;
        if uncovered && floor_mask.get_pixel(x, y)[0] == 255 {
            Luma([255])
        } else {
            Luma([0])
        }
    }))
}

/// Fill gap pixels from a plain resize of the tiled texture.
///
/// Only pixels flagged in `gaps` change, so the projective alignment of the
/// rest of the floor is kept.
pub fn repair_coverage(
    warped: &RgbImage,
    tiled: &RgbImage,
    gaps: &BinaryMask,
) -> Result<RgbImage, OverlayError> {
    OverlayError::check_dimensions(warped.dimensions(), gaps.dimensions())?;

    let (width, height) = warped.dimensions();
    let filler = imageops::resize(tiled, width, height, imageops::FilterType::Triangle);

    let mut repaired = warped.clone();
    let mut patched = 0usize;
    for (x, y, gap) in gaps.enumerate_pixels() {
        if gap[0] == 255 {
            repaired.put_pixel(x, y, *filler.get_pixel(x, y));
            patched += 1;
        }
    }
    tracing::debug!("Patched {} uncovered floor pixels", patched);
    Ok(repaired)
}

/// Tile, warp and gap-fill a texture over the floor quadrilateral.
///
/// The result is canvas-sized; compositing it with the room through the
/// floor mask is left to [`crate::composite::hard_stencil`].
pub fn tile_floor(
    texture: &RgbImage,
    quad: &Quad,
    floor_mask: &BinaryMask,
    gap_luma: u8,
) -> Result<RgbImage, OverlayError> {
    let _span = tracing::debug_span!("tile_floor").entered();

    if texture.width() == 0 || texture.height() == 0 {
        return Err(OverlayError::UnreadableImage("texture is empty".to_string()));
    }

    if quad.area() == 0.0 {
        return Err(OverlayError::DegenerateGeometry(format!(
            "floor quadrilateral {:?} has no area",
            quad
        )));
    }

    let tiled = tile_2x2(texture);
    let (width, height) = floor_mask.dimensions();
    match warp_onto_quad(&tiled, quad, width, height) {
        Ok(warped) => {
            let gaps = coverage_gaps(&warped, floor_mask, gap_luma)?;
            repair_coverage(&warped, &tiled, &gaps)
        }
        // corners collapse but the floor has area: cover all of it unwarped
        Err(OverlayError::DegenerateGeometry(reason)) => {
            tracing::warn!("No perspective for the floor, tiling flat: {}", reason);
            repair_coverage(&RgbImage::new(width, height), &tiled, floor_mask)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::point::Point;
    use imageproc::rect::Rect;

    fn square_quad(x0: i32, y0: i32, x1: i32, y1: i32) -> Quad {
        Quad::new(
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        )
    }

    #[test]
    fn tiles_two_by_two() {
        let texture = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8, y as u8, 7]));
        let tiled = tile_2x2(&texture);
        assert_eq!(tiled.dimensions(), (6, 4));
        assert_eq!(tiled.get_pixel(4, 3), texture.get_pixel(1, 1));
        assert_eq!(tiled.get_pixel(0, 2), texture.get_pixel(0, 0));
    }

    #[test]
    fn luma_weights() {
        assert_eq!(luma(&Rgb([255, 255, 255])), 255);
        assert_eq!(luma(&Rgb([0, 0, 0])), 0);
        assert_eq!(luma(&Rgb([255, 0, 0])), 76);
    }

    #[test]
    fn warp_covers_quad_only() -> Result<(), OverlayError> {
        let texture = RgbImage::from_pixel(40, 40, Rgb([200, 120, 40]));
        let quad = Quad::new(
            Point::new(20, 10),
            Point::new(60, 12),
            Point::new(75, 70),
            Point::new(5, 68),
        );
        let warped = warp_onto_quad(&texture, &quad, 80, 80)?;
        assert_eq!(warped.dimensions(), (80, 80));
        assert_eq!(*warped.get_pixel(40, 40), Rgb([200, 120, 40]));
        assert_eq!(*warped.get_pixel(1, 1), Rgb([0, 0, 0]));
        assert_eq!(*warped.get_pixel(78, 2), Rgb([0, 0, 0]));
        Ok(())
    }

    #[test]
    fn gaps_are_black_floor_pixels() -> Result<(), OverlayError> {
        let mut warped = RgbImage::from_pixel(10, 10, Rgb([90, 90, 90]));
        warped.put_pixel(2, 2, Rgb([1, 1, 1]));
        warped.put_pixel(8, 8, Rgb([0, 0, 0]));
        let mut mask = GrayImage::new(10, 10);
        draw_filled_rect_mut(&mut mask, Rect::at(0, 0).of_size(5, 5), Luma([255]));

        let gaps = coverage_gaps(&warped, &mask, 5)?;
        assert_eq!(gaps.get_pixel(2, 2)[0], 255);
        // black but outside the floor
        assert_eq!(gaps.get_pixel(8, 8)[0], 0);
        assert_eq!(gaps.get_pixel(3, 3)[0], 0);
        Ok(())
    }

    #[test]
    fn repair_touches_only_gaps() -> Result<(), OverlayError> {
        let warped = RgbImage::new(8, 8);
        let tiled = RgbImage::from_pixel(4, 4, Rgb([10, 200, 30]));
        let mut gaps = GrayImage::new(8, 8);
        gaps.put_pixel(3, 4, Luma([255]));

        let repaired = repair_coverage(&warped, &tiled, &gaps)?;
        assert_eq!(*repaired.get_pixel(3, 4), Rgb([10, 200, 30]));
        assert_eq!(*repaired.get_pixel(0, 0), Rgb([0, 0, 0]));
        Ok(())
    }

    #[test]
    fn floor_is_fully_covered() -> Result<(), OverlayError> {
        let texture = RgbImage::from_fn(16, 16, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                Rgb([230, 220, 200])
            } else {
                Rgb([120, 80, 60])
            }
        });
        let mut mask = GrayImage::new(64, 48);
        draw_filled_rect_mut(&mut mask, Rect::at(0, 20).of_size(64, 28), Luma([255]));
        // quad narrower than the mask, leaving uncovered floor on both sides
        let quad = square_quad(10, 20, 50, 47);

        let floor = tile_floor(&texture, &quad, &mask, 5)?;
        for (x, y, pixel) in floor.enumerate_pixels() {
            if mask.get_pixel(x, y)[0] == 255 {
                assert!(luma(pixel) >= 5, "gap left at ({x}, {y})");
            }
        }
        Ok(())
    }

    #[test]
    fn pointed_floor_is_tiled_flat() -> Result<(), OverlayError> {
        let texture = RgbImage::from_pixel(20, 20, Rgb([150, 110, 70]));
        let mut mask = GrayImage::new(400, 300);
        draw_filled_rect_mut(&mut mask, Rect::at(0, 250).of_size(400, 50), Luma([255]));
        // top corners meet in a single point
        let quad = Quad::new(
            Point::new(200, 20),
            Point::new(200, 20),
            Point::new(399, 250),
            Point::new(0, 250),
        );
        assert!(quad.area() > 0.0);

        let floor = tile_floor(&texture, &quad, &mask, 5)?;
        assert_eq!(*floor.get_pixel(10, 280), Rgb([150, 110, 70]));
        assert_eq!(*floor.get_pixel(10, 10), Rgb([0, 0, 0]));
        Ok(())
    }

    #[test]
    fn flat_floor_quad_is_degenerate() {
        let texture = RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]));
        let mask = GrayImage::from_pixel(20, 20, Luma([255]));
        let line = Quad::new(
            Point::new(5, 0),
            Point::new(5, 0),
            Point::new(5, 19),
            Point::new(5, 19),
        );
        assert!(matches!(
            tile_floor(&texture, &line, &mask, 5),
            Err(OverlayError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn mismatched_mask_is_rejected() {
        let warped = RgbImage::new(4, 4);
        let mask = GrayImage::new(5, 4);
        assert!(matches!(
            coverage_gaps(&warped, &mask, 5),
            Err(OverlayError::DimensionMismatch { .. })
        ));
    }
}
