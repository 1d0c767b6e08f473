//! Merging warped or placed layers back into the room photo.

mod alpha;
mod blend;
mod kernels;

pub use alpha::{
    binary_silhouette, feathered_alpha, fill_holes, gaussian_blur, intersect, smooth_threshold,
};
pub use blend::{hard_stencil, soft_blend, transparent_output};
pub use kernels::gaussian_kernel_1d;
