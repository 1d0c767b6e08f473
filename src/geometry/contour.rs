use super::corners::{order_corners, Quad};
use crate::error::OverlayError;
use crate::types::BinaryMask;
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::convex_hull;
use imageproc::point::Point;

/// Floor outline recovered from a segmentation mask
#[derive(Debug, Clone)]
pub struct FloorGeometry {
    /// Ordered floor corners
    pub quad: Quad,
    /// Convex hull the corners were picked from
    pub hull: Vec<Point<i32>>,
    /// Thresholded mask, 0 or 255
    pub mask: BinaryMask,
}

/// `v > threshold → 255`, everything else 0
pub fn binarize(mask: &GrayImage, threshold: u8) -> BinaryMask {
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        if mask.get_pixel(x, y)[0] > threshold {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Absolute shoelace area of a closed polygon
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    twice.abs() as f64 / 2.0
}

/// Outer contour enclosing the largest area.
///
/// Only top-level borders are considered; holes and contours nested inside
/// another region are ignored. On equal areas the first contour found wins.
pub fn largest_external_contour(mask: &BinaryMask) -> Result<Vec<Point<i32>>, OverlayError> {
    let contours = find_contours::<i32>(mask);

    let mut best: Option<(f64, Vec<Point<i32>>)> = None;
    for contour in contours {
        if contour.parent.is_some() || contour.border_type != BorderType::Outer {
            continue;
        }
        let area = polygon_area(&contour.points);
        match &best {
            Some((best_area, _)) if *best_area >= area => {}
            _ => best = Some((area, contour.points)),
        }
    }

    best.map(|(_, points)| points)
        .ok_or(OverlayError::NoFloorDetected)
}

/// Threshold a raw floor mask and reduce its largest region to four corners
pub fn extract_floor_quad(mask: &GrayImage, threshold: u8) -> Result<FloorGeometry, OverlayError> {
    let _span = tracing::debug_span!("extract_floor_quad").entered();

    let binary = binarize(mask, threshold);
    let contour = largest_external_contour(&binary)?;
    let hull: Vec<Point<i32>> = convex_hull(contour.as_slice());
    tracing::debug!(
        "Floor contour has {} points, hull {}",
        contour.len(),
        hull.len()
    );

    let quad = order_corners(&hull)?;
    if !quad.is_simple() {
        tracing::warn!("Floor quadrilateral is self-intersecting: {:?}", quad);
    }

    Ok(FloorGeometry {
        quad,
        hull,
        mask: binary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::{draw_filled_rect_mut, draw_polygon_mut};
    use imageproc::rect::Rect;

    #[test]
    fn binarize_threshold_is_exclusive() {
        let mask = GrayImage::from_raw(3, 1, vec![40, 41, 255]).unwrap();
        let binary = binarize(&mask, 40);
        assert_eq!(binary.as_raw(), &vec![0, 255, 255]);
    }

    #[test]
    fn shoelace_area() {
        let square = [
            Point::new(0, 0),
            Point::new(4, 0),
            Point::new(4, 4),
            Point::new(0, 4),
        ];
        assert_eq!(polygon_area(&square), 16.0);
        assert_eq!(polygon_area(&square[..2]), 0.0);
    }

    #[test]
    fn empty_mask_has_no_floor() {
        let mask = GrayImage::new(32, 32);
        assert!(matches!(
            extract_floor_quad(&mask, 40),
            Err(OverlayError::NoFloorDetected)
        ));
    }

    #[test]
    fn picks_largest_region() -> Result<(), OverlayError> {
        let mut mask = GrayImage::new(100, 100);
        draw_filled_rect_mut(&mut mask, Rect::at(2, 2).of_size(10, 10), Luma([255]));
        draw_filled_rect_mut(&mut mask, Rect::at(30, 40).of_size(50, 40), Luma([255]));
        let geometry = extract_floor_quad(&mask, 40)?;
        assert_eq!(geometry.quad.top_left(), Point::new(30, 40));
        assert_eq!(geometry.quad.bottom_right(), Point::new(79, 79));
        Ok(())
    }

    #[test]
    fn faint_pixels_are_not_floor() -> Result<(), OverlayError> {
        let mut mask = GrayImage::new(60, 60);
        draw_filled_rect_mut(&mut mask, Rect::at(0, 0).of_size(60, 60), Luma([30]));
        draw_filled_rect_mut(&mut mask, Rect::at(10, 20).of_size(20, 20), Luma([200]));
        let geometry = extract_floor_quad(&mask, 40)?;
        assert_eq!(geometry.quad.top_left(), Point::new(10, 20));
        assert_eq!(geometry.mask.get_pixel(0, 0)[0], 0);
        assert_eq!(geometry.mask.get_pixel(15, 25)[0], 255);
        Ok(())
    }

    #[test]
    fn hexagonal_floor_reduces_to_simple_quad() -> Result<(), OverlayError> {
        let mut mask = GrayImage::new(1920, 1080);
        let hexagon = [
            Point::new(600, 540),
            Point::new(1300, 540),
            Point::new(1800, 760),
            Point::new(1700, 1079),
            Point::new(200, 1079),
            Point::new(100, 760),
        ];
        draw_polygon_mut(&mut mask, &hexagon, Luma([255]));

        let geometry = extract_floor_quad(&mask, 40)?;
        let corners = geometry.quad.corners();
        assert_eq!(corners.len(), 4);
        assert!(geometry.quad.is_simple());
        assert!(geometry.quad.area() > 0.0);
        assert!(geometry.hull.len() >= 4);
        // top corners above bottom corners, left corners left of right ones
        assert!(geometry.quad.top_left().y < geometry.quad.bottom_left().y);
        assert!(geometry.quad.top_right().y < geometry.quad.bottom_right().y);
        assert!(geometry.quad.top_left().x < geometry.quad.top_right().x);
        assert!(geometry.quad.bottom_left().x < geometry.quad.bottom_right().x);
        Ok(())
    }
}
