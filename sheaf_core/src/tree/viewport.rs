// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `viewBox` and `preserveAspectRatio`.

use kurbo::{Affine, Rect, Size};

/// Alignment of the view box inside the viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Align {
    /// Scale non-uniformly to fill the viewport.
    None,
    /// Left, top.
    XMinYMin,
    /// Center, top.
    XMidYMin,
    /// Right, top.
    XMaxYMin,
    /// Left, middle.
    XMinYMid,
    /// Center, middle.
    #[default]
    XMidYMid,
    /// Right, middle.
    XMaxYMid,
    /// Left, bottom.
    XMinYMax,
    /// Center, bottom.
    XMidYMax,
    /// Right, bottom.
    XMaxYMax,
}

impl Align {
    /// Returns the horizontal and vertical alignment factors in `[0, 1]`.
    const fn factors(self) -> (f64, f64) {
        match self {
            Self::None | Self::XMinYMin => (0.0, 0.0),
            Self::XMidYMin => (0.5, 0.0),
            Self::XMaxYMin => (1.0, 0.0),
            Self::XMinYMid => (0.0, 0.5),
            Self::XMidYMid => (0.5, 0.5),
            Self::XMaxYMid => (1.0, 0.5),
            Self::XMinYMax => (0.0, 1.0),
            Self::XMidYMax => (0.5, 1.0),
            Self::XMaxYMax => (1.0, 1.0),
        }
    }
}

/// Whether the view box is fit inside (`meet`) or covers (`slice`) the
/// viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MeetOrSlice {
    /// Entire view box visible.
    #[default]
    Meet,
    /// Viewport entirely covered.
    Slice,
}

/// `preserveAspectRatio`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PreserveAspectRatio {
    /// Alignment.
    pub align: Align,
    /// Meet or slice.
    pub meet_or_slice: MeetOrSlice,
}

impl PreserveAspectRatio {
    /// `none`.
    pub const NONE: Self = Self {
        align: Align::None,
        meet_or_slice: MeetOrSlice::Meet,
    };

    /// Returns the transform mapping `view_box` into a viewport of `size`
    /// placed at the origin.
    ///
    /// Returns `None` for an empty view box or viewport; such viewports do
    /// not render.
    #[must_use]
    pub fn view_box_transform(self, view_box: Rect, size: Size) -> Option<Affine> {
        if !(view_box.width() > 0.0 && view_box.height() > 0.0) {
            return None;
        }
        if !(size.width > 0.0 && size.height > 0.0) {
            return None;
        }
        let sx = size.width / view_box.width();
        let sy = size.height / view_box.height();
        if self.align == Align::None {
            return Some(
                Affine::scale_non_uniform(sx, sy)
                    * Affine::translate((-view_box.x0, -view_box.y0)),
            );
        }
        let scale = match self.meet_or_slice {
            MeetOrSlice::Meet => sx.min(sy),
            MeetOrSlice::Slice => sx.max(sy),
        };
        let (fx, fy) = self.align.factors();
        let tx = (size.width - view_box.width() * scale) * fx;
        let ty = (size.height - view_box.height() * scale) * fy;
        Some(
            Affine::translate((tx, ty))
                * Affine::scale(scale)
                * Affine::translate((-view_box.x0, -view_box.y0)),
        )
    }

    /// Places content of intrinsic `size` into `viewport`.
    ///
    /// Returns the rectangle the content is drawn into and whether it must be
    /// clipped to `viewport` (only `slice` can overflow).
    #[must_use]
    pub fn place(self, size: Size, viewport: Rect) -> Option<(Rect, bool)> {
        let t = self.view_box_transform(size.to_rect(), viewport.size())?;
        let placed = (Affine::translate(viewport.origin().to_vec2()) * t)
            .transform_rect_bbox(size.to_rect());
        let clip = self.align != Align::None && self.meet_or_slice == MeetOrSlice::Slice;
        Some((placed, clip))
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Point;

    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn meet_centers_the_short_axis() {
        let t = PreserveAspectRatio::default()
            .view_box_transform(Rect::new(0.0, 0.0, 10.0, 10.0), Size::new(200.0, 100.0))
            .unwrap();
        assert!(close(t * Point::new(0.0, 0.0), Point::new(50.0, 0.0)));
        assert!(close(t * Point::new(10.0, 10.0), Point::new(150.0, 100.0)));
    }

    #[test]
    fn slice_covers_and_aligns_max() {
        let par = PreserveAspectRatio {
            align: Align::XMaxYMax,
            meet_or_slice: MeetOrSlice::Slice,
        };
        let t = par
            .view_box_transform(Rect::new(0.0, 0.0, 10.0, 10.0), Size::new(200.0, 100.0))
            .unwrap();
        assert!(close(t * Point::new(10.0, 10.0), Point::new(200.0, 100.0)));
        assert!(close(t * Point::new(0.0, 0.0), Point::new(0.0, -100.0)));
    }

    #[test]
    fn none_stretches_and_honours_origin() {
        let t = PreserveAspectRatio::NONE
            .view_box_transform(Rect::new(5.0, 5.0, 15.0, 25.0), Size::new(100.0, 100.0))
            .unwrap();
        assert!(close(t * Point::new(5.0, 5.0), Point::new(0.0, 0.0)));
        assert!(close(t * Point::new(15.0, 25.0), Point::new(100.0, 100.0)));
    }

    #[test]
    fn empty_view_box_does_not_render() {
        let par = PreserveAspectRatio::default();
        assert!(par.view_box_transform(Rect::new(0.0, 0.0, 0.0, 10.0), Size::new(10.0, 10.0)).is_none());
        assert!(par.view_box_transform(Rect::new(0.0, 0.0, 10.0, 10.0), Size::ZERO).is_none());
    }

    #[test]
    fn image_placement_with_slice_requests_clip() {
        let par = PreserveAspectRatio {
            align: Align::XMidYMid,
            meet_or_slice: MeetOrSlice::Slice,
        };
        let (placed, clip) = par
            .place(Size::new(10.0, 20.0), Rect::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        assert!(clip);
        assert!((placed.width() - 100.0).abs() < 1e-9);
        assert!((placed.height() - 200.0).abs() < 1e-9);
        assert!((placed.y0 + 50.0).abs() < 1e-9);
    }
}
