use crate::error::OverlayError;
use imageproc::geometric_transformations::Projection;

/// Projective map from one planar quadrilateral to another.
///
/// Wraps the `imageproc` projection so it can be handed straight to a warp.
#[derive(Debug, Clone, Copy)]
pub struct Homography {
    projection: Projection,
}

impl Homography {
    /// Exact homography taking each `src[i]` to `dst[i]`.
    ///
    /// Three collinear or coincident corners on either side leave no
    /// invertible solution and yield [`OverlayError::DegenerateGeometry`].
    pub fn from_quads(src: &[(f32, f32); 4], dst: &[(f32, f32); 4]) -> Result<Self, OverlayError> {
        for quad in [src, dst] {
            if has_collinear_corners(quad) {
                return Err(OverlayError::DegenerateGeometry(format!(
                    "quadrilateral {:?} has three collinear corners",
                    quad
                )));
            }
        }

        let projection = Projection::from_control_points(*src, *dst).ok_or_else(|| {
            OverlayError::DegenerateGeometry(format!(
                "no invertible homography from {:?} to {:?}",
                src, dst
            ))
        })?;
        Ok(Self { projection })
    }

    /// Homography from the rectangle `(0,0)-(width,height)` onto `dst`
    pub fn from_rect(width: u32, height: u32, dst: &[(f32, f32); 4]) -> Result<Self, OverlayError> {
        let (w, h) = (width as f32, height as f32);
        Self::from_quads(&[(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)], dst)
    }

    /// Map a point through the homography
    pub fn project(&self, point: (f32, f32)) -> (f32, f32) {
        self.projection * point
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }
}

// any of the four corner triples spans (almost) no area
fn has_collinear_corners(quad: &[(f32, f32); 4]) -> bool {
    let scale = quad
        .iter()
        .flat_map(|&(x, y)| [x.abs(), y.abs()])
        .fold(1.0f32, f32::max);
    let eps = 1e-6 * scale * scale;

    (0..4).any(|skip| {
        let [a, b, c]: [(f32, f32); 3] = match skip {
            0 => [quad[1], quad[2], quad[3]],
            1 => [quad[0], quad[2], quad[3]],
            2 => [quad[0], quad[1], quad[3]],
            _ => [quad[0], quad[1], quad[2]],
        };
        let cross = (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0);
        cross.abs() <= eps
    })
}
