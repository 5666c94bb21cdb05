//! 2×3 affine matrices for rotate / skew / flip / scale.
//!
//! Stored as a homogeneous `Matrix3<f64>`:
//!
//! ```text
//! | m11 m21 dx |   x' = m11·x + m21·y + dx
//! | m12 m22 dy |   y' = m12·x + m22·y + dy
//! |  0   0   1 |
//! ```
//!
//! Every builder returns a zero-origin matrix: the mapped bounding box of the
//! source rectangle starts at (0, 0).
use nalgebra::{Matrix3, Vector3};

use crate::geom::Rect;

/// Angles closer than this (in degrees) are considered equal:
/// `degrees(atan(1 / 10000)) / 4`.
pub const ANGLE_EPSILON: f64 = 0.001_432_394_483_052_409_7;

const IDENTITY_EPSILON: f64 = 1e-12;
/// Slack for corners that land on an integer up to rounding error.
const EDGE_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformMatrix {
    m: Matrix3<f64>,
}

impl Default for TransformMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl TransformMatrix {
    pub fn identity() -> Self {
        Self {
            m: Matrix3::identity(),
        }
    }

    pub fn new(m11: f64, m12: f64, m21: f64, m22: f64, dx: f64, dy: f64) -> Self {
        Self {
            m: Matrix3::new(m11, m21, dx, m12, m22, dy, 0.0, 0.0, 1.0),
        }
    }

    pub fn translation(dx: f64, dy: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, dx, dy)
    }

    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn as_matrix3(&self) -> &Matrix3<f64> {
        &self.m
    }

    #[inline]
    pub fn map(&self, x: f64, y: f64) -> (f64, f64) {
        let p = self.m * Vector3::new(x, y, 1.0);
        (p.x, p.y)
    }

    /// `None` for a singular matrix.
    pub fn inverse(&self) -> Option<Self> {
        self.m.try_inverse().map(|m| Self { m })
    }

    /// This transform followed by `next`.
    pub fn then(&self, next: &TransformMatrix) -> Self {
        Self { m: next.m * self.m }
    }

    /// Exact `(min_x, min_y, max_x, max_y)` of the four mapped corners.
    fn mapped_extent(&self, rect: Rect) -> (f64, f64, f64, f64) {
        let (x0, y0) = (rect.x as f64, rect.y as f64);
        let (x1, y1) = (rect.right() as f64, rect.bottom() as f64);
        let corners = [
            self.map(x0, y0),
            self.map(x1, y0),
            self.map(x0, y1),
            self.map(x1, y1),
        ];
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (x, y) in corners {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        (min_x, min_y, max_x, max_y)
    }

    /// Smallest integer rectangle covering the four mapped corners. Corners
    /// within [`EDGE_EPSILON`] of an integer count as exactly on it.
    pub fn map_rect(&self, rect: Rect) -> Rect {
        let (min_x, min_y, max_x, max_y) = self.mapped_extent(rect);
        let left = (min_x + EDGE_EPSILON).floor() as i32;
        let top = (min_y + EDGE_EPSILON).floor() as i32;
        let right = ((max_x - EDGE_EPSILON).ceil() as i32).max(left);
        let bottom = ((max_y - EDGE_EPSILON).ceil() as i32).max(top);
        Rect::new(left, top, right - left, bottom - top)
    }

    /// Translates so that a mapped `w × h` source starts exactly at the origin.
    pub fn with_zero_origin(&self, w: usize, h: usize) -> Self {
        let (min_x, min_y, _, _) = self.mapped_extent(Rect::of_size(w, h));
        self.then(&Self::translation(-min_x, -min_y))
    }

    pub fn is_identity(&self) -> bool {
        (self.m - Matrix3::identity())
            .iter()
            .all(|v| v.abs() <= IDENTITY_EPSILON)
    }
}

/// `sin`/`cos` of an angle in degrees, exact at multiples of 90°.
fn sin_cos_degrees(angle: f64) -> (f64, f64) {
    let reduced = angle.rem_euclid(360.0);
    if reduced == 0.0 {
        (0.0, 1.0)
    } else if reduced == 90.0 {
        (1.0, 0.0)
    } else if reduced == 180.0 {
        (0.0, -1.0)
    } else if reduced == 270.0 {
        (-1.0, 0.0)
    } else {
        reduced.to_radians().sin_cos()
    }
}

/// Clockwise rotation (y axis pointing down) about the centre of a `w × h`
/// source.
pub fn rotate_matrix(w: usize, h: usize, angle: f64) -> TransformMatrix {
    let (sin, cos) = sin_cos_degrees(angle);
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    TransformMatrix::translation(-cx, -cy)
        .then(&TransformMatrix::new(cos, sin, -sin, cos, 0.0, 0.0))
        .then(&TransformMatrix::translation(cx, cy))
        .with_zero_origin(w, h)
}

/// Shear by `tan(horizontal)` along x and `tan(vertical)` along y.
///
/// Both angles within [`ANGLE_EPSILON`] of zero give the identity.
pub fn skew_matrix(w: usize, h: usize, horizontal: f64, vertical: f64) -> TransformMatrix {
    if horizontal.abs() < ANGLE_EPSILON && vertical.abs() < ANGLE_EPSILON {
        return TransformMatrix::identity();
    }
    let m21 = horizontal.to_radians().tan();
    let m12 = vertical.to_radians().tan();
    TransformMatrix::new(1.0, m12, m21, 1.0, 0.0, 0.0).with_zero_origin(w, h)
}

pub fn flip_matrix(w: usize, h: usize, horizontal: bool, vertical: bool) -> TransformMatrix {
    let sx = if horizontal { -1.0 } else { 1.0 };
    let sy = if vertical { -1.0 } else { 1.0 };
    TransformMatrix::scaling(sx, sy).with_zero_origin(w, h)
}

pub fn scale_matrix(sx: f64, sy: f64) -> TransformMatrix {
    TransformMatrix::scaling(sx, sy)
}

/// Whether rotating by `angle` degrees moves pixels without resampling, i.e.
/// the angle is a multiple of 90° up to [`ANGLE_EPSILON`].
pub fn is_lossless_rotation(angle: f64) -> bool {
    let residue = angle.abs() % 90.0;
    residue < ANGLE_EPSILON || (90.0 - residue) < ANGLE_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_maps(m: &TransformMatrix, from: (f64, f64), to: (f64, f64)) {
        let (x, y) = m.map(from.0, from.1);
        assert!((x - to.0).abs() < 1e-9 && (y - to.1).abs() < 1e-9, "{from:?} -> ({x}, {y}), expected {to:?}");
    }

    #[test]
    fn epsilon_matches_definition() {
        let expected = (1.0f64 / 10000.0).atan().to_degrees() / 4.0;
        assert!((ANGLE_EPSILON - expected).abs() < 1e-15);
    }

    #[test]
    fn then_applies_left_to_right() {
        let m = TransformMatrix::scaling(2.0, 3.0).then(&TransformMatrix::translation(1.0, -1.0));
        assert_maps(&m, (1.0, 1.0), (3.0, 2.0));
        let inv = m.inverse().expect("invertible");
        assert_maps(&inv, (3.0, 2.0), (1.0, 1.0));
    }

    #[test]
    fn rotate_quarter_turn_is_exact_and_zero_origin() {
        let m = rotate_matrix(10, 6, 90.0);
        assert_eq!(m.map_rect(Rect::of_size(10, 6)), Rect::new(0, 0, 6, 10));
        // Top-left corner ends up at the top-right.
        assert_maps(&m, (0.0, 0.0), (6.0, 0.0));
        assert!(rotate_matrix(7, 3, 360.0).is_identity());
    }

    #[test]
    fn rotate_arbitrary_angle_grows_bounds() {
        let r = rotate_matrix(10, 10, 45.0).map_rect(Rect::of_size(10, 10));
        assert_eq!((r.x, r.y), (0, 0));
        assert_eq!((r.w, r.h), (15, 15));
    }

    #[test]
    fn quarter_turn_of_mixed_parity_stays_tight() {
        // Corners of a 4×3 rotated about (2, 1.5) land on half-integers.
        let m = rotate_matrix(4, 3, 90.0);
        assert_eq!(m.map_rect(Rect::of_size(4, 3)), Rect::new(0, 0, 3, 4));
        assert_maps(&m, (0.0, 0.0), (3.0, 0.0));
        assert_maps(&m, (4.0, 3.0), (0.0, 4.0));
        let m = rotate_matrix(7, 4, 270.0);
        assert_eq!(m.map_rect(Rect::of_size(7, 4)), Rect::new(0, 0, 4, 7));
    }

    #[test]
    fn skew_near_zero_is_identity() {
        assert!(skew_matrix(100, 100, 0.0, 0.0).is_identity());
        assert!(skew_matrix(100, 100, ANGLE_EPSILON / 2.0, -ANGLE_EPSILON / 2.0).is_identity());
        let m = skew_matrix(100, 50, 45.0, 0.0);
        assert_eq!(m.map_rect(Rect::of_size(100, 50)), Rect::new(0, 0, 150, 50));
        let m = skew_matrix(100, 50, -45.0, 0.0);
        assert_eq!(m.map_rect(Rect::of_size(100, 50)), Rect::new(0, 0, 150, 50));
    }

    #[test]
    fn flip_maps_edges_onto_each_other() {
        let m = flip_matrix(8, 4, true, false);
        assert_maps(&m, (0.0, 0.0), (8.0, 0.0));
        assert_maps(&m, (8.0, 4.0), (0.0, 4.0));
        assert!(flip_matrix(8, 4, false, false).is_identity());
    }

    #[test]
    fn lossless_rotation_detection() {
        for angle in [0.0, 90.0, -90.0, 180.0, 270.0, 360.0, 450.0, 89.9999, -0.0005] {
            assert!(is_lossless_rotation(angle), "{angle}");
        }
        for angle in [1.0, 45.0, 89.9, -30.0, 0.01] {
            assert!(!is_lossless_rotation(angle), "{angle}");
        }
    }
}
