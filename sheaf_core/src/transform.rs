// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Affine helpers and accumulated coordinate-mapping state.
//!
//! Everything here works on [`kurbo::Affine`]. The only additions are the
//! checks the render tree needs to fail closed on degenerate input:
//! [`checked_inverse`] never hands out a transform containing NaN or
//! infinities, and [`TransformState`] reports `None` instead of mapping through
//! a singular matrix.

use kurbo::{Affine, Point, Rect};
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// Returns whether `t` has a finite, non-zero determinant.
#[inline]
#[must_use]
pub fn is_invertible(t: Affine) -> bool {
    let det = t.determinant();
    det != 0.0 && det.is_finite()
}

/// Returns the inverse of `t`, or `None` if it is singular or the inverse is
/// not finite.
#[must_use]
pub fn checked_inverse(t: Affine) -> Option<Affine> {
    if !is_invertible(t) {
        return None;
    }
    let inv = t.inverse();
    inv.is_finite().then_some(inv)
}

/// Returns the transform that maps the unit square onto `bbox`.
///
/// This is the objectBoundingBox units transform: `translate(x, y)` followed by
/// `scale(width, height)`.
#[inline]
#[must_use]
pub fn bbox_units_transform(bbox: Rect) -> Affine {
    Affine::translate(bbox.origin().to_vec2()) * Affine::scale_non_uniform(bbox.width(), bbox.height())
}

/// Returns the scale at which content drawn through `t` reaches the screen.
///
/// This is the root-mean-square of the two axis scales. Text and
/// non-scaling strokes are measured at this factor, so a change in it forces
/// re-layout of those nodes.
#[must_use]
pub fn screen_scaling_factor(t: Affine) -> f64 {
    let [a, b, c, d, _, _] = t.as_coeffs();
    let factor = ((a * a + b * b + c * c + d * d) / 2.0).sqrt();
    if factor.is_finite() && factor > 0.0 {
        factor
    } else {
        1.0
    }
}

/// Which way a [`TransformState`] maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapDirection {
    /// From a node's local space out to an ancestor's space.
    LocalToAncestor,
    /// From an ancestor's space into a node's local space.
    AncestorToLocal,
}

/// Accumulates `local_to_parent` steps while walking up the tree.
///
/// Steps are always applied in the local-to-ancestor sense (innermost first).
/// For [`MapDirection::AncestorToLocal`] the accumulated transform is inverted
/// when it is read, and reading fails if it is singular.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformState {
    direction: MapDirection,
    accumulated: Affine,
}

impl TransformState {
    /// Creates an identity state mapping in `direction`.
    #[must_use]
    pub const fn new(direction: MapDirection) -> Self {
        Self {
            direction,
            accumulated: Affine::IDENTITY,
        }
    }

    /// Returns the mapping direction.
    #[must_use]
    pub const fn direction(&self) -> MapDirection {
        self.direction
    }

    /// Applies one step that maps the current space into its parent's space.
    pub fn apply(&mut self, step: Affine) {
        self.accumulated = step * self.accumulated;
    }

    /// Returns the local-to-ancestor transform accumulated so far.
    #[must_use]
    pub const fn accumulated(&self) -> Affine {
        self.accumulated
    }

    /// Returns the transform in this state's direction, or `None` if it
    /// cannot be inverted.
    #[must_use]
    pub fn transform(&self) -> Option<Affine> {
        match self.direction {
            MapDirection::LocalToAncestor => {
                self.accumulated.is_finite().then_some(self.accumulated)
            }
            MapDirection::AncestorToLocal => checked_inverse(self.accumulated),
        }
    }

    /// Maps a point in this state's direction.
    #[must_use]
    pub fn map_point(&self, p: Point) -> Option<Point> {
        self.transform().map(|t| t * p)
    }

    /// Maps a rectangle in this state's direction, returning the bounding box
    /// of the mapped quad.
    #[must_use]
    pub fn map_rect(&self, r: Rect) -> Option<Rect> {
        self.transform().map(|t| t.transform_rect_bbox(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn singular_transforms_are_not_invertible() {
        assert!(!is_invertible(Affine::scale(0.0)));
        assert!(!is_invertible(Affine::scale_non_uniform(1.0, 0.0)));
        assert!(checked_inverse(Affine::scale(0.0)).is_none());
        assert!(is_invertible(Affine::translate((3.0, 4.0))));
    }

    #[test]
    fn nan_transform_is_not_invertible() {
        let t = Affine::new([f64::NAN, 0.0, 0.0, 1.0, 0.0, 0.0]);
        assert!(checked_inverse(t).is_none());
    }

    #[test]
    fn bbox_units_maps_unit_square_onto_bbox() {
        let bbox = Rect::new(10.0, 20.0, 110.0, 70.0);
        let t = bbox_units_transform(bbox);
        assert!(close(t * Point::new(0.0, 0.0), Point::new(10.0, 20.0)));
        assert!(close(t * Point::new(1.0, 1.0), Point::new(110.0, 70.0)));
    }

    #[test]
    fn scaling_factor_of_uniform_scale() {
        let f = screen_scaling_factor(Affine::scale(3.0) * Affine::rotate(0.7));
        assert!((f - 3.0).abs() < 1e-9, "got {f}");
        assert_eq!(screen_scaling_factor(Affine::scale(0.0)), 1.0);
    }

    #[test]
    fn round_trip_through_state() {
        let mut up = TransformState::new(MapDirection::LocalToAncestor);
        up.apply(Affine::scale(2.0));
        up.apply(Affine::translate((5.0, -3.0)));
        let mut down = TransformState::new(MapDirection::AncestorToLocal);
        down.apply(Affine::scale(2.0));
        down.apply(Affine::translate((5.0, -3.0)));

        let p = Point::new(1.25, -7.5);
        let there = up.map_point(p).unwrap();
        assert!(close(there, Point::new(7.5, -18.0)));
        let back = down.map_point(there).unwrap();
        assert!(close(back, p), "round trip should reproduce {p:?}, got {back:?}");
    }

    #[test]
    fn ancestor_to_local_through_singular_step_fails() {
        let mut down = TransformState::new(MapDirection::AncestorToLocal);
        down.apply(Affine::scale_non_uniform(0.0, 1.0));
        assert!(down.map_point(Point::new(1.0, 1.0)).is_none());
        assert!(down.map_rect(Rect::new(0.0, 0.0, 1.0, 1.0)).is_none());
    }
}
