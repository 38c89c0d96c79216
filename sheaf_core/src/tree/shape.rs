// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic-shape geometry, path construction and stroke/marker geometry.

use alloc::vec::Vec;
use core::f64::consts::{FRAC_PI_2, PI, SQRT_2};

use kurbo::{Arc, BezPath, Cap, Circle, Ellipse, Join, PathEl, Point, Rect, Shape, Size, Stroke, Vec2};
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::length::{Length, LengthMode};

/// Flattening tolerance used when converting conic shapes to Béziers.
const PATH_TOLERANCE: f64 = 0.1;

/// The geometry attributes of a shape element.
#[derive(Clone, Debug)]
pub enum ShapeGeometry {
    /// `<rect>`; `rx`/`ry` default to each other when only one is set.
    Rect {
        /// Left edge.
        x: Length,
        /// Top edge.
        y: Length,
        /// Width.
        width: Length,
        /// Height.
        height: Length,
        /// Horizontal corner radius.
        rx: Option<Length>,
        /// Vertical corner radius.
        ry: Option<Length>,
    },
    /// `<circle>`.
    Circle {
        /// Center x.
        cx: Length,
        /// Center y.
        cy: Length,
        /// Radius.
        r: Length,
    },
    /// `<ellipse>`.
    Ellipse {
        /// Center x.
        cx: Length,
        /// Center y.
        cy: Length,
        /// Horizontal radius.
        rx: Length,
        /// Vertical radius.
        ry: Length,
    },
    /// `<line>`.
    Line {
        /// Start x.
        x1: Length,
        /// Start y.
        y1: Length,
        /// End x.
        x2: Length,
        /// End y.
        y2: Length,
    },
    /// `<polyline>`.
    Polyline(Vec<Point>),
    /// `<polygon>`.
    Polygon(Vec<Point>),
    /// `<path>`.
    Path(BezPath),
}

impl ShapeGeometry {
    /// A `<rect>` of absolute lengths without rounded corners.
    #[must_use]
    pub const fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::Rect {
            x: Length::Number(x),
            y: Length::Number(y),
            width: Length::Number(width),
            height: Length::Number(height),
            rx: None,
            ry: None,
        }
    }

    /// A `<circle>` of absolute lengths.
    #[must_use]
    pub const fn circle(cx: f64, cy: f64, r: f64) -> Self {
        Self::Circle {
            cx: Length::Number(cx),
            cy: Length::Number(cy),
            r: Length::Number(r),
        }
    }

    /// Returns whether any attribute is a percentage.
    #[must_use]
    pub fn has_relative_lengths(&self) -> bool {
        match self {
            Self::Rect {
                x,
                y,
                width,
                height,
                rx,
                ry,
            } => {
                x.is_relative()
                    || y.is_relative()
                    || width.is_relative()
                    || height.is_relative()
                    || rx.is_some_and(Length::is_relative)
                    || ry.is_some_and(Length::is_relative)
            }
            Self::Circle { cx, cy, r } => cx.is_relative() || cy.is_relative() || r.is_relative(),
            Self::Ellipse { cx, cy, rx, ry } => {
                cx.is_relative() || cy.is_relative() || rx.is_relative() || ry.is_relative()
            }
            Self::Line { x1, y1, x2, y2 } => {
                x1.is_relative() || y1.is_relative() || x2.is_relative() || y2.is_relative()
            }
            Self::Polyline(_) | Self::Polygon(_) | Self::Path(_) => false,
        }
    }

    /// Returns whether markers are drawn on this shape.
    #[must_use]
    pub const fn supports_markers(&self) -> bool {
        matches!(
            self,
            Self::Line { .. } | Self::Polyline(_) | Self::Polygon(_) | Self::Path(_)
        )
    }

    /// Returns whether the outline can have non-right-angle corners, where
    /// miter joins extend past half the stroke width.
    const fn may_have_sharp_corners(&self) -> bool {
        matches!(self, Self::Polyline(_) | Self::Polygon(_) | Self::Path(_))
    }

    /// Builds the path in user space, or `None` if the shape is degenerate
    /// and does not render.
    #[must_use]
    pub fn to_path(&self, viewport: Size) -> Option<BezPath> {
        let w = |l: Length| l.resolve(LengthMode::Width, viewport);
        let h = |l: Length| l.resolve(LengthMode::Height, viewport);
        match self {
            Self::Rect {
                x,
                y,
                width,
                height,
                rx,
                ry,
            } => {
                let (x, y, width, height) = (w(*x), h(*y), w(*width), h(*height));
                if !(width > 0.0 && height > 0.0) {
                    return None;
                }
                let (rx, ry) = match (rx.map(w), ry.map(h)) {
                    (Some(rx), Some(ry)) => (rx, ry),
                    (Some(r), None) | (None, Some(r)) => (r, r),
                    (None, None) => (0.0, 0.0),
                };
                let rx = rx.clamp(0.0, width / 2.0);
                let ry = ry.clamp(0.0, height / 2.0);
                Some(rounded_rect_path(Rect::new(x, y, x + width, y + height), rx, ry))
            }
            Self::Circle { cx, cy, r } => {
                let r = r.resolve(LengthMode::Other, viewport);
                (r > 0.0).then(|| Circle::new((w(*cx), h(*cy)), r).to_path(PATH_TOLERANCE))
            }
            Self::Ellipse { cx, cy, rx, ry } => {
                let (rx, ry) = (w(*rx), h(*ry));
                (rx > 0.0 && ry > 0.0).then(|| {
                    Ellipse::new((w(*cx), h(*cy)), (rx, ry), 0.0).to_path(PATH_TOLERANCE)
                })
            }
            Self::Line { x1, y1, x2, y2 } => {
                let mut path = BezPath::new();
                path.move_to((w(*x1), h(*y1)));
                path.line_to((w(*x2), h(*y2)));
                Some(path)
            }
            Self::Polyline(points) => poly_path(points, false),
            Self::Polygon(points) => poly_path(points, true),
            Self::Path(path) => (!path.elements().is_empty()).then(|| path.clone()),
        }
    }

    /// Approximates the stroke bounding box from the object bounding box.
    ///
    /// The result always contains `object_bbox`.
    #[must_use]
    pub fn approximate_stroke_bbox(&self, object_bbox: Rect, stroke: &Stroke) -> Rect {
        let half = stroke.width / 2.0;
        let mut delta = half;
        if stroke.join == Join::Miter && self.may_have_sharp_corners() {
            delta = half * stroke.miter_limit.max(1.0);
        }
        if stroke.start_cap == Cap::Square || stroke.end_cap == Cap::Square {
            delta = delta.max(half * SQRT_2);
        }
        object_bbox.inflate(delta, delta)
    }
}

fn poly_path(points: &[Point], close: bool) -> Option<BezPath> {
    let (first, rest) = points.split_first()?;
    if rest.is_empty() {
        return None;
    }
    let mut path = BezPath::new();
    path.move_to(*first);
    for p in rest {
        path.line_to(*p);
    }
    if close {
        path.close_path();
    }
    Some(path)
}

fn rounded_rect_path(r: Rect, rx: f64, ry: f64) -> BezPath {
    let mut path = BezPath::new();
    if rx <= 0.0 || ry <= 0.0 {
        path.move_to((r.x0, r.y0));
        path.line_to((r.x1, r.y0));
        path.line_to((r.x1, r.y1));
        path.line_to((r.x0, r.y1));
        path.close_path();
        return path;
    }
    let corner = |path: &mut BezPath, center: Point, start: f64| {
        let arc = Arc::new(center, Vec2::new(rx, ry), start, FRAC_PI_2, 0.0);
        path.extend(arc.append_iter(PATH_TOLERANCE));
    };
    path.move_to((r.x0 + rx, r.y0));
    path.line_to((r.x1 - rx, r.y0));
    corner(&mut path, Point::new(r.x1 - rx, r.y0 + ry), -FRAC_PI_2);
    path.line_to((r.x1, r.y1 - ry));
    corner(&mut path, Point::new(r.x1 - rx, r.y1 - ry), 0.0);
    path.line_to((r.x0 + rx, r.y1));
    corner(&mut path, Point::new(r.x0 + rx, r.y1 - ry), FRAC_PI_2);
    path.line_to((r.x0, r.y0 + ry));
    corner(&mut path, Point::new(r.x0 + rx, r.y0 + ry), PI);
    path.close_path();
    path
}

/// Where on the path a marker vertex sits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexRole {
    /// First vertex.
    Start,
    /// Interior vertex.
    Mid,
    /// Last vertex.
    End,
}

/// A path vertex with its marker orientation.
#[derive(Clone, Copy, Debug)]
pub struct MarkerVertex {
    /// Position in user space.
    pub point: Point,
    /// Auto-orientation angle in radians (bisector of in/out directions).
    pub angle: f64,
    /// Position along the path.
    pub role: VertexRole,
}

#[derive(Clone, Copy)]
struct RawVertex {
    point: Point,
    incoming: Option<Vec2>,
    outgoing: Option<Vec2>,
}

fn first_nonzero(candidates: &[Vec2]) -> Option<Vec2> {
    candidates.iter().copied().find(|v| v.hypot2() > 0.0)
}

/// Returns the marker vertices of `path` in path order.
#[must_use]
pub fn marker_vertices(path: &BezPath) -> Vec<MarkerVertex> {
    let mut raw: Vec<RawVertex> = Vec::new();
    let mut current = Point::ZERO;
    let mut subpath_start = 0_usize;
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                subpath_start = raw.len();
                raw.push(RawVertex {
                    point: p,
                    incoming: None,
                    outgoing: None,
                });
                current = p;
            }
            PathEl::LineTo(p) => {
                let d = first_nonzero(&[p - current]);
                push_segment(&mut raw, d, d, p);
                current = p;
            }
            PathEl::QuadTo(c, p) => {
                let out = first_nonzero(&[c - current, p - current]);
                let inc = first_nonzero(&[p - c, p - current]);
                push_segment(&mut raw, out, inc, p);
                current = p;
            }
            PathEl::CurveTo(c1, c2, p) => {
                let out = first_nonzero(&[c1 - current, c2 - current, p - current]);
                let inc = first_nonzero(&[p - c2, p - c1, p - current]);
                push_segment(&mut raw, out, inc, p);
                current = p;
            }
            PathEl::ClosePath => {
                let Some(start) = raw.get(subpath_start).copied() else {
                    continue;
                };
                let d = first_nonzero(&[start.point - current]);
                push_segment(&mut raw, d, d, start.point);
                let closing = raw.len() - 1;
                raw[closing].outgoing = start.outgoing;
                raw[subpath_start].incoming = raw[closing].incoming;
                current = start.point;
            }
        }
    }

    let last = raw.len().saturating_sub(1);
    raw.iter()
        .enumerate()
        .map(|(i, v)| MarkerVertex {
            point: v.point,
            angle: bisect(v.incoming, v.outgoing),
            role: if i == 0 {
                VertexRole::Start
            } else if i == last {
                VertexRole::End
            } else {
                VertexRole::Mid
            },
        })
        .collect()
}

fn push_segment(raw: &mut Vec<RawVertex>, out: Option<Vec2>, inc: Option<Vec2>, end: Point) {
    if let Some(prev) = raw.last_mut() {
        prev.outgoing = out;
    }
    raw.push(RawVertex {
        point: end,
        incoming: inc,
        outgoing: None,
    });
}

fn bisect(incoming: Option<Vec2>, outgoing: Option<Vec2>) -> f64 {
    match (incoming, outgoing) {
        (Some(a), Some(b)) => {
            let a1 = a.atan2();
            let mut a2 = b.atan2();
            if (a2 - a1).abs() > PI {
                a2 -= 2.0 * PI * (a2 - a1).signum();
            }
            (a1 + a2) / 2.0
        }
        (Some(d), None) | (None, Some(d)) => d.atan2(),
        (None, None) => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn rect_path_bbox_matches_attributes() {
        let path = ShapeGeometry::rect(10.0, 20.0, 100.0, 50.0)
            .to_path(Size::new(500.0, 500.0))
            .unwrap();
        assert_eq!(path.bounding_box(), Rect::new(10.0, 20.0, 110.0, 70.0));
    }

    #[test]
    fn rounded_rect_keeps_bbox() {
        let geom = ShapeGeometry::Rect {
            x: Length::ZERO,
            y: Length::ZERO,
            width: Length::Number(40.0),
            height: Length::Number(20.0),
            rx: Some(Length::Number(100.0)),
            ry: None,
        };
        let bbox = geom.to_path(Size::ZERO).unwrap().bounding_box();
        assert!((bbox.width() - 40.0).abs() < 1e-6, "bbox = {bbox:?}");
        assert!((bbox.height() - 20.0).abs() < 1e-6, "bbox = {bbox:?}");
    }

    #[test]
    fn degenerate_shapes_have_no_path() {
        assert!(ShapeGeometry::rect(0.0, 0.0, 0.0, 10.0).to_path(Size::ZERO).is_none());
        assert!(ShapeGeometry::circle(5.0, 5.0, 0.0).to_path(Size::ZERO).is_none());
        assert!(ShapeGeometry::Path(BezPath::new()).to_path(Size::ZERO).is_none());
        assert!(ShapeGeometry::Polyline(alloc::vec![Point::ZERO]).to_path(Size::ZERO).is_none());
    }

    #[test]
    fn percent_circle_uses_diagonal() {
        let geom = ShapeGeometry::Circle {
            cx: Length::Percent(50.0),
            cy: Length::Percent(50.0),
            r: Length::Percent(10.0),
        };
        assert!(geom.has_relative_lengths());
        let bbox = geom.to_path(Size::new(100.0, 100.0)).unwrap().bounding_box();
        assert!((bbox.center().x - 50.0).abs() < 1e-6);
        assert!((bbox.width() - 20.0).abs() < 1e-3, "bbox = {bbox:?}");
    }

    #[test]
    fn stroke_bbox_contains_object_bbox() {
        let obb = Rect::new(0.0, 0.0, 10.0, 10.0);
        let stroke = Stroke::new(4.0);
        let rect = ShapeGeometry::rect(0.0, 0.0, 10.0, 10.0);
        let sbb = rect.approximate_stroke_bbox(obb, &stroke);
        assert_eq!(sbb, Rect::new(-2.0, -2.0, 12.0, 12.0));
        let path = ShapeGeometry::Path(BezPath::new());
        let sbb = path.approximate_stroke_bbox(obb, &stroke.clone().with_join(Join::Miter));
        assert!(sbb.contains_rect(obb));
        assert!((sbb.x0 + 8.0).abs() < EPS, "miter limit 4 extends to 8");
    }

    #[test]
    fn polyline_vertices_bisect_corners() {
        let path = poly_path(
            &[Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)],
            false,
        )
        .unwrap();
        let v = marker_vertices(&path);
        assert_eq!(v.len(), 3);
        assert_eq!(v[0].role, VertexRole::Start);
        assert_eq!(v[1].role, VertexRole::Mid);
        assert_eq!(v[2].role, VertexRole::End);
        assert!(v[0].angle.abs() < EPS);
        assert!((v[1].angle - PI / 4.0).abs() < EPS, "angle = {}", v[1].angle);
        assert!((v[2].angle - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn closed_polygon_start_uses_closing_segment() {
        let path = poly_path(
            &[Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)],
            true,
        )
        .unwrap();
        let v = marker_vertices(&path);
        assert_eq!(v.len(), 4, "closing vertex is repeated at the start point");
        assert!((v[3].point - v[0].point).hypot() < EPS);
        assert!((v[0].angle - v[3].angle).abs() < EPS);
    }
}
