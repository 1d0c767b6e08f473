use crate::types::Centroid;
use image::GrayImage;
use imageproc::point::Point;

/// Centroid of a closed polygon from its area moments (Green's theorem).
///
/// Returns `None` for polygons with zero area, e.g. a single pixel or a line.
pub fn polygon_centroid(points: &[Point<i32>]) -> Option<Centroid> {
    if points.len() < 3 {
        return None;
    }

    let (mut m00, mut m10, mut m01) = (0.0f64, 0.0f64, 0.0f64);
    for (a, b) in points.iter().zip(points.iter().cycle().skip(1)) {
        let (xa, ya, xb, yb) = (a.x as f64, a.y as f64, b.x as f64, b.y as f64);
        let cross = xa * yb - xb * ya;
        m00 += cross;
        m10 += (xa + xb) * cross;
        m01 += (ya + yb) * cross;
    }
    m00 /= 2.0;
    m10 /= 6.0;
    m01 /= 6.0;

    if m00 == 0.0 {
        return None;
    }
    // orientation flips all three moments alike, so the ratio is unaffected
    Some(Centroid::new((m10 / m00) as i32, (m01 / m00) as i32))
}

/// Mean coordinate of all non-zero pixels, `None` if there are none
pub fn pixel_centroid(mask: &GrayImage) -> Option<Centroid> {
    let (mut count, mut sum_x, mut sum_y) = (0u64, 0u64, 0u64);
    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel[0] > 0 {
            count += 1;
            sum_x += x as u64;
            sum_y += y as u64;
        }
    }
    if count == 0 {
        return None;
    }
    Some(Centroid::new(
        (sum_x as f64 / count as f64) as i32,
        (sum_y as f64 / count as f64) as i32,
    ))
}
