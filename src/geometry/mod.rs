//! Floor-mask geometry: contours, corner ordering, homographies and moments.

mod contour;
mod corners;
mod homography;
mod moments;

pub use contour::{binarize, extract_floor_quad, largest_external_contour, polygon_area, FloorGeometry};
pub use corners::{order_corners, Quad};
pub use homography::Homography;
pub use moments::{pixel_centroid, polygon_centroid};
