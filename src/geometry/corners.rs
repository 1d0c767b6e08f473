use crate::error::OverlayError;
use imageproc::point::Point;

/// Floor quadrilateral in top-left, top-right, bottom-right, bottom-left order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quad {
    corners: [Point<i32>; 4],
}

impl Quad {
    pub fn new(
        top_left: Point<i32>,
        top_right: Point<i32>,
        bottom_right: Point<i32>,
        bottom_left: Point<i32>,
    ) -> Self {
        Self {
            corners: [top_left, top_right, bottom_right, bottom_left],
        }
    }

    pub fn corners(&self) -> &[Point<i32>; 4] {
        &self.corners
    }

    pub fn top_left(&self) -> Point<i32> {
        self.corners[0]
    }

    pub fn top_right(&self) -> Point<i32> {
        self.corners[1]
    }

    pub fn bottom_right(&self) -> Point<i32> {
        self.corners[2]
    }

    pub fn bottom_left(&self) -> Point<i32> {
        self.corners[3]
    }

    /// Corners as floating point pairs, for homography estimation
    pub fn to_f32(&self) -> [(f32, f32); 4] {
        self.corners.map(|p| (p.x as f32, p.y as f32))
    }

    /// Shoelace area in square pixels
    pub fn area(&self) -> f64 {
        super::polygon_area(&self.corners)
    }

    /// True when no two opposite edges cross each other
    pub fn is_simple(&self) -> bool {
        let [a, b, c, d] = self.corners;
        !segments_cross(a, b, c, d) && !segments_cross(b, c, d, a)
    }
}

fn orientation(a: Point<i32>, b: Point<i32>, c: Point<i32>) -> i64 {
    let cross = (b.x - a.x) as i64 * (c.y - a.y) as i64 - (b.y - a.y) as i64 * (c.x - a.x) as i64;
    cross.signum()
}

// proper crossings only; touching or collinear edges do not count
fn segments_cross(p1: Point<i32>, p2: Point<i32>, q1: Point<i32>, q2: Point<i32>) -> bool {
    let o1 = orientation(p1, p2, q1);
    let o2 = orientation(p1, p2, q2);
    let o3 = orientation(q1, q2, p1);
    let o4 = orientation(q1, q2, p2);
    o1 * o2 < 0 && o3 * o4 < 0
}

/// Reduce an arbitrary point set (usually a convex hull) to four ordered corners.
///
/// Points are split into a top and a bottom cluster at the largest vertical
/// gap between consecutive y values. The extreme x of each cluster gives the
/// left and right corners. The result does not depend on the input order.
pub fn order_corners(points: &[Point<i32>]) -> Result<Quad, OverlayError> {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| (p.y, p.x));

    let mut split_y = None;
    let mut widest = 0;
    for pair in sorted.windows(2) {
        let gap = pair[1].y - pair[0].y;
        if gap > widest {
            widest = gap;
            split_y = Some(pair[0].y);
        }
    }

    let split_y = split_y.ok_or_else(|| {
        OverlayError::DegenerateGeometry(format!(
            "{} hull points share a single row, cannot separate top from bottom",
            points.len()
        ))
    })?;

    let (top, bottom): (Vec<Point<i32>>, Vec<Point<i32>>) =
        sorted.iter().partition(|p| p.y <= split_y);

    // both clusters are non-empty because the split sits inside a positive gap
    let leftmost = |cluster: &[Point<i32>]| cluster.iter().copied().min_by_key(|p| p.x);
    let rightmost = |cluster: &[Point<i32>]| cluster.iter().rev().copied().max_by_key(|p| p.x);

    match (
        leftmost(&top[..]),
        rightmost(&top[..]),
        rightmost(&bottom[..]),
        leftmost(&bottom[..]),
    ) {
        (Some(tl), Some(tr), Some(br), Some(bl)) => Ok(Quad::new(tl, tr, br, bl)),
        _ => Err(OverlayError::DegenerateGeometry(
            "empty corner cluster".to_string(),
        )),
    }
}
