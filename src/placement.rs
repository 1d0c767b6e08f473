//! Scaling a carpet and anchoring it at the floor centre.

use crate::error::OverlayError;
use crate::geometry::{largest_external_contour, polygon_centroid};
use crate::types::{BinaryMask, Centroid};
use image::{imageops, GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;
use std::str::FromStr;
use thiserror::Error;

/// Malformed physical size hint such as `"13x9"`
#[derive(Debug, Error, PartialEq)]
#[error("invalid carpet dimensions '{0}', expected '<width>/<height>' with positive numbers")]
pub struct DimensionHintError(pub String);

/// Physical carpet size, in any unit, written `width/height`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionHint {
    pub width: f64,
    pub height: f64,
}

impl DimensionHint {
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

impl FromStr for DimensionHint {
    type Err = DimensionHintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DimensionHintError(s.to_string());
        let (width, height) = s.split_once('/').ok_or_else(malformed)?;
        let width: f64 = width.trim().parse().map_err(|_| malformed())?;
        let height: f64 = height.trim().parse().map_err(|_| malformed())?;
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return Err(malformed());
        }
        Ok(Self { width, height })
    }
}

/// Bounding box a carpet is scaled into.
///
/// With a valid hint the box is a third of the room height tall and as wide
/// as the hint's aspect ratio asks. Without one, or when the hint does not
/// parse, the box is a third of the room in each direction.
pub fn target_box(room_width: u32, room_height: u32, hint: Option<&str>) -> (u32, u32) {
    let max_height = (room_height / 3).max(1);
    let default_box = ((room_width / 3).max(1), max_height);

    let Some(raw) = hint else {
        return default_box;
    };

    match raw.parse::<DimensionHint>() {
        Ok(dimensions) => {
            tracing::debug!(
                "Scaling carpet with dimensions {} x {}",
                dimensions.width,
                dimensions.height
            );
            let max_width = (max_height as f64 * dimensions.aspect_ratio()) as u32;
            (max_width.max(1), max_height)
        }
        Err(err) => {
            tracing::warn!("{}; using default scaling", err);
            default_box
        }
    }
}

/// Resize to fit inside `bounds`, keeping the aspect ratio
pub fn scale_to_box(carpet: &RgbImage, bounds: (u32, u32)) -> RgbImage {
    let (width, height) = carpet.dimensions();
    let scale = f64::min(
        bounds.0 as f64 / width as f64,
        bounds.1 as f64 / height as f64,
    );
    let new_width = ((width as f64 * scale) as u32).max(1);
    let new_height = ((height as f64 * scale) as u32).max(1);
    tracing::debug!(
        "Resizing carpet {}x{} -> {}x{}",
        width,
        height,
        new_width,
        new_height
    );
    imageops::resize(carpet, new_width, new_height, imageops::FilterType::Triangle)
}

/// Paint floor pixels pure red on black, the form the centre finder expects
pub fn paint_floor_marker(mask: &BinaryMask) -> RgbImage {
    RgbImage::from_fn(mask.width(), mask.height(), |x, y| {
        if mask.get_pixel(x, y)[0] > 0 {
            Rgb([255, 0, 0])
        } else {
            Rgb([0, 0, 0])
        }
    })
}

/// Convert one RGB pixel to HSV.
///
/// # Returns
///
/// * H: The hue in the range [0, 180) (half degrees, the 8-bit OpenCV scale).
/// * S: The saturation in the range [0, 255].
/// * V: The value in the range [0, 255].
fn hsv_from_rgb(pixel: &Rgb<u8>) -> (u8, u8, u8) {
    let [r, g, b] = pixel.0.map(|c| c as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = max - min;

    let s = if max > 0.0 { diff / max * 255.0 } else { 0.0 };
    let mut h = if diff == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / diff
    } else if max == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    (
        (h / 2.0).round().min(179.0) as u8,
        s.round() as u8,
        max as u8,
    )
}

/// Strong red: hue at either end of the circle, saturated and bright enough
pub fn red_marker_mask(image: &RgbImage) -> BinaryMask {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let (h, s, v) = hsv_from_rgb(image.get_pixel(x, y));
        let red_hue = h <= 10 || h >= 170;
        if red_hue && s >= 120 && v >= 70 {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Centre of the largest red marker region, from its contour moments.
///
/// Returns `None` when there is no marker at all or the largest region has
/// zero area.
pub fn find_floor_center(marked: &RgbImage) -> Option<Centroid> {
    let _span = tracing::debug_span!("find_floor_center").entered();

    let red = red_marker_mask(marked);
    let contour = match largest_external_contour(&red) {
        Ok(contour) => contour,
        Err(_) => {
            tracing::debug!("No floor marker detected");
            return None;
        }
    };
    let center = polygon_centroid(&contour);
    if let Some(center) = center {
        tracing::debug!("Floor centre at {}", center);
    }
    center
}

/// Copy of `marked` with a small green dot on the centre
pub fn mark_center(marked: &RgbImage, center: Centroid) -> RgbImage {
    let mut out = marked.clone();
    draw_filled_circle_mut(&mut out, (center.x, center.y), 5, Rgb([0, 255, 0]));
    out
}

/// Floor centre of a segmentation mask, or [`OverlayError::FloorCenterNotFound`]
pub fn floor_anchor(mask: &BinaryMask) -> Result<Centroid, OverlayError> {
    find_floor_center(&paint_floor_marker(mask)).ok_or(OverlayError::FloorCenterNotFound)
}

/// Centre `carpet` on `anchor` over a black canvas.
///
/// A carpet spilling past an edge is shifted back inside rather than
/// cropped; only a carpet larger than the canvas loses pixels.
pub fn place_on_canvas(carpet: &RgbImage, width: u32, height: u32, anchor: Centroid) -> RgbImage {
    let mut canvas = RgbImage::new(width, height);
    let (cw, ch) = (carpet.width() as i64, carpet.height() as i64);
    let (w, h) = (width as i64, height as i64);

    let mut x0 = anchor.x as i64 - cw / 2;
    let mut y0 = anchor.y as i64 - ch / 2;
    let mut x1 = x0 + cw;
    let mut y1 = y0 + ch;

    if x0 < 0 {
        x0 = 0;
        x1 = cw.min(w);
    }
    if y0 < 0 {
        y0 = 0;
        y1 = ch.min(h);
    }
    if x1 > w {
        x1 = w;
        x0 = (w - cw).max(0);
    }
    if y1 > h {
        y1 = h;
        y0 = (h - ch).max(0);
    }

    tracing::debug!(
        "Placing carpet {}x{} at [{}, {}) x [{}, {})",
        cw,
        ch,
        x0,
        x1,
        y0,
        y1
    );

    for y in y0..y1 {
        for x in x0..x1 {
            let pixel = *carpet.get_pixel((x - x0) as u32, (y - y0) as u32);
            canvas.put_pixel(x as u32, y as u32, pixel);
        }
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    #[test]
    fn parses_hint() {
        let hint: DimensionHint = "13/9".parse().unwrap();
        assert_eq!(hint, DimensionHint { width: 13.0, height: 9.0 });
        assert_eq!(" 6.5 / 4 ".parse::<DimensionHint>().map(|h| h.width), Ok(6.5));
    }

    #[test]
    fn rejects_bad_hints() {
        for bad in ["13x9", "13/", "a/b", "13/0", "-2/3", "inf/2", ""] {
            assert!(bad.parse::<DimensionHint>().is_err(), "{bad} parsed");
        }
    }

    #[test]
    fn hint_sets_box() {
        assert_eq!(target_box(1920, 1080, Some("13/9")), (520, 360));
    }

    #[test]
    fn default_box_is_a_third() {
        assert_eq!(target_box(1920, 1080, None), (640, 360));
        assert_eq!(target_box(1920, 1080, Some("13 by 9")), (640, 360));
        assert_eq!(target_box(2, 2, None), (1, 1));
    }

    #[test]
    fn scales_square_carpet_into_box() {
        let carpet = RgbImage::from_pixel(500, 500, Rgb([9, 9, 9]));
        let scaled = scale_to_box(&carpet, target_box(1920, 1080, Some("13/9")));
        assert_eq!(scaled.dimensions(), (360, 360));

        let wide = RgbImage::new(400, 100);
        assert_eq!(scale_to_box(&wide, (200, 200)).dimensions(), (200, 50));
    }

    #[test]
    fn hsv_of_primaries() {
        assert_eq!(hsv_from_rgb(&Rgb([255, 0, 0])), (0, 255, 255));
        assert_eq!(hsv_from_rgb(&Rgb([0, 255, 0])), (60, 255, 255));
        assert_eq!(hsv_from_rgb(&Rgb([0, 0, 0])), (0, 0, 0));
    }

    #[test]
    fn finds_center_of_red_region() {
        let mut mask = GrayImage::new(200, 100);
        draw_filled_rect_mut(&mut mask, Rect::at(40, 50).of_size(101, 41), Luma([255]));
        // a smaller blob that must lose to the larger one
        draw_filled_rect_mut(&mut mask, Rect::at(0, 0).of_size(5, 5), Luma([255]));
        let center = find_floor_center(&paint_floor_marker(&mask));
        assert_eq!(center, Some(Centroid::new(90, 70)));
    }

    #[test]
    fn missing_marker_is_not_found() {
        let mask = GrayImage::new(64, 64);
        assert_eq!(find_floor_center(&paint_floor_marker(&mask)), None);
        assert!(matches!(
            floor_anchor(&mask),
            Err(OverlayError::FloorCenterNotFound)
        ));
    }

    #[test]
    fn non_red_pixels_are_ignored() {
        let image = RgbImage::from_pixel(20, 20, Rgb([200, 200, 200]));
        assert_eq!(find_floor_center(&image), None);
    }

    #[test]
    fn mark_draws_green_dot() {
        let marked = RgbImage::new(20, 20);
        let dotted = mark_center(&marked, Centroid::new(10, 10));
        assert_eq!(*dotted.get_pixel(10, 10), Rgb([0, 255, 0]));
        assert_eq!(*dotted.get_pixel(0, 0), Rgb([0, 0, 0]));
    }

    fn carpet(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([x as u8 + 1, y as u8 + 1, 50]))
    }

    fn painted_bounds(canvas: &RgbImage) -> (u32, u32, u32, u32) {
        let painted: Vec<(u32, u32)> = canvas
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0 != [0, 0, 0])
            .map(|(x, y, _)| (x, y))
            .collect();
        let min_x = painted.iter().map(|p| p.0).min().unwrap();
        let max_x = painted.iter().map(|p| p.0).max().unwrap();
        let min_y = painted.iter().map(|p| p.1).min().unwrap();
        let max_y = painted.iter().map(|p| p.1).max().unwrap();
        (min_x, min_y, max_x, max_y)
    }

    #[test]
    fn centers_on_anchor() {
        let canvas = place_on_canvas(&carpet(20, 10), 100, 80, Centroid::new(50, 40));
        assert_eq!(painted_bounds(&canvas), (40, 35, 59, 44));
        assert_eq!(*canvas.get_pixel(40, 35), Rgb([1, 1, 50]));
    }

    #[test]
    fn shifts_instead_of_cropping() {
        let canvas = place_on_canvas(&carpet(20, 10), 100, 80, Centroid::new(97, 2));
        assert_eq!(painted_bounds(&canvas), (80, 0, 99, 9));
        // the carpet's own top-left pixel lands on the shifted origin
        assert_eq!(*canvas.get_pixel(80, 0), Rgb([1, 1, 50]));
    }

    #[test]
    fn oversized_carpet_is_clipped_to_canvas() {
        let canvas = place_on_canvas(&carpet(30, 30), 20, 10, Centroid::new(10, 5));
        assert_eq!(canvas.dimensions(), (20, 10));
        assert_eq!(painted_bounds(&canvas), (0, 0, 19, 9));
        assert_eq!(*canvas.get_pixel(0, 0), Rgb([1, 1, 50]));
    }
}
