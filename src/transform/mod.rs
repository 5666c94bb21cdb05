//! Affine transforms: matrix construction, resampling, flips and resizing.
pub mod matrix;
pub mod scale;
pub mod xform;

pub use matrix::{
    flip_matrix, is_lossless_rotation, rotate_matrix, scale_matrix, skew_matrix, TransformMatrix,
    ANGLE_EPSILON,
};
pub use scale::scale;
pub use xform::{flip, rotate, skew, xform};
