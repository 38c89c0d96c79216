// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lengths, unit modes and their resolution.
//!
//! A [`Length`] is either an absolute user-space number or a percentage. In
//! user space, percentages resolve against the nearest viewport: widths
//! against its width, heights against its height, and everything else
//! against the normalized diagonal `sqrt((w² + h²) / 2)`. Under
//! [`Units::ObjectBoundingBox`], numbers are fractions of the client's
//! bounding box and percentages are divided by 100.

use kurbo::{Rect, Size};
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// Which viewport dimension a percentage resolves against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LengthMode {
    /// Horizontal lengths (`x`, `width`, `cx`, `rx`).
    Width,
    /// Vertical lengths (`y`, `height`, `cy`, `ry`).
    Height,
    /// Direction-less lengths (`r`, `stroke-width`).
    Other,
}

/// Coordinate interpretation for resource geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Units {
    /// Geometry is in the user space in effect where the resource is
    /// referenced.
    #[default]
    UserSpaceOnUse,
    /// Geometry is relative to the client's object bounding box.
    ObjectBoundingBox,
}

/// A length value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Length {
    /// An absolute number in user units.
    Number(f64),
    /// A percentage (`50.0` means 50%).
    Percent(f64),
}

impl Default for Length {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Length {
    /// Zero user units.
    pub const ZERO: Self = Self::Number(0.0);

    /// Returns whether the value depends on the viewport size.
    #[inline]
    #[must_use]
    pub const fn is_relative(self) -> bool {
        matches!(self, Self::Percent(_))
    }

    /// Resolves the length in user space against `viewport`.
    #[must_use]
    pub fn resolve(self, mode: LengthMode, viewport: Size) -> f64 {
        match self {
            Self::Number(n) => n,
            Self::Percent(p) => {
                let basis = match mode {
                    LengthMode::Width => viewport.width,
                    LengthMode::Height => viewport.height,
                    LengthMode::Other => normalized_diagonal(viewport),
                };
                p / 100.0 * basis
            }
        }
    }

    /// Resolves the length as a bounding-box fraction.
    #[inline]
    #[must_use]
    pub fn fraction(self) -> f64 {
        match self {
            Self::Number(n) => n,
            Self::Percent(p) => p / 100.0,
        }
    }

    /// Resolves the length under `units`.
    ///
    /// Under objectBoundingBox units the result is a fraction of the unit
    /// square; callers map it through the client's bounding box.
    #[must_use]
    pub fn resolve_in(self, units: Units, mode: LengthMode, viewport: Size) -> f64 {
        match units {
            Units::UserSpaceOnUse => self.resolve(mode, viewport),
            Units::ObjectBoundingBox => self.fraction(),
        }
    }
}

/// Returns `sqrt((w² + h²) / 2)`.
#[must_use]
pub fn normalized_diagonal(size: Size) -> f64 {
    ((size.width * size.width + size.height * size.height) / 2.0).sqrt()
}

/// An `x`/`y`/`width`/`height` quadruple of lengths, used for resource
/// regions and viewport placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LengthRect {
    /// Left edge.
    pub x: Length,
    /// Top edge.
    pub y: Length,
    /// Width.
    pub width: Length,
    /// Height.
    pub height: Length,
}

impl LengthRect {
    /// The default mask and filter region: `-10% -10% 120% 120%`.
    pub const DEFAULT_EFFECT_REGION: Self = Self {
        x: Length::Percent(-10.0),
        y: Length::Percent(-10.0),
        width: Length::Percent(120.0),
        height: Length::Percent(120.0),
    };

    /// Creates a rectangle of absolute lengths.
    #[must_use]
    pub const fn numbers(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: Length::Number(x),
            y: Length::Number(y),
            width: Length::Number(width),
            height: Length::Number(height),
        }
    }

    /// Returns whether any component depends on the viewport size.
    #[must_use]
    pub const fn is_relative(&self) -> bool {
        self.x.is_relative()
            || self.y.is_relative()
            || self.width.is_relative()
            || self.height.is_relative()
    }

    /// Resolves in user space against `viewport`.
    #[must_use]
    pub fn resolve_user(&self, viewport: Size) -> Rect {
        self.resolve(Units::UserSpaceOnUse, viewport, Rect::ZERO)
    }

    /// Resolves to a user-space rectangle.
    ///
    /// With objectBoundingBox units the fractions are mapped through `bbox`;
    /// with userSpaceOnUse units they are resolved against `viewport`.
    /// Negative sizes clamp to zero.
    #[must_use]
    pub fn resolve(&self, units: Units, viewport: Size, bbox: Rect) -> Rect {
        let (x, y, w, h) = match units {
            Units::UserSpaceOnUse => (
                self.x.resolve(LengthMode::Width, viewport),
                self.y.resolve(LengthMode::Height, viewport),
                self.width.resolve(LengthMode::Width, viewport),
                self.height.resolve(LengthMode::Height, viewport),
            ),
            Units::ObjectBoundingBox => (
                bbox.x0 + self.x.fraction() * bbox.width(),
                bbox.y0 + self.y.fraction() * bbox.height(),
                self.width.fraction() * bbox.width(),
                self.height.fraction() * bbox.height(),
            ),
        };
        Rect::new(x, y, x + w.max(0.0), y + h.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn percent_resolves_against_viewport_axis() {
        let vp = Size::new(200.0, 100.0);
        assert!((Length::Percent(50.0).resolve(LengthMode::Width, vp) - 100.0).abs() < EPS);
        assert!((Length::Percent(50.0).resolve(LengthMode::Height, vp) - 50.0).abs() < EPS);
        let diag = normalized_diagonal(vp);
        assert!((Length::Percent(100.0).resolve(LengthMode::Other, vp) - diag).abs() < EPS);
        assert!((Length::Number(7.0).resolve(LengthMode::Other, vp) - 7.0).abs() < EPS);
    }

    #[test]
    fn bbox_region_default_is_ten_percent_outset() {
        let bbox = Rect::new(10.0, 20.0, 110.0, 70.0);
        let r = LengthRect::DEFAULT_EFFECT_REGION.resolve(
            Units::ObjectBoundingBox,
            Size::new(500.0, 500.0),
            bbox,
        );
        assert!((r.x0 - 0.0).abs() < EPS, "x0 = {}", r.x0);
        assert!((r.y0 - 15.0).abs() < EPS, "y0 = {}", r.y0);
        assert!((r.width() - 120.0).abs() < EPS);
        assert!((r.height() - 60.0).abs() < EPS);
    }

    #[test]
    fn user_space_region_ignores_bbox() {
        let r = LengthRect::numbers(1.0, 2.0, 3.0, 4.0).resolve(
            Units::UserSpaceOnUse,
            Size::new(10.0, 10.0),
            Rect::new(100.0, 100.0, 200.0, 200.0),
        );
        assert_eq!(r, Rect::new(1.0, 2.0, 4.0, 6.0));
    }

    #[test]
    fn negative_size_clamps_to_empty() {
        let r = LengthRect::numbers(5.0, 5.0, -3.0, 2.0).resolve(
            Units::UserSpaceOnUse,
            Size::ZERO,
            Rect::ZERO,
        );
        assert_eq!(r.width(), 0.0);
        assert_eq!(r.height(), 2.0);
    }

    #[test]
    fn relative_detection() {
        assert!(!LengthRect::numbers(0.0, 0.0, 1.0, 1.0).is_relative());
        assert!(LengthRect::DEFAULT_EFFECT_REGION.is_relative());
    }
}
