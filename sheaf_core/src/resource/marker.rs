// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Marker placement.

use alloc::vec::Vec;

use kurbo::{Affine, BezPath, Point, Rect, Size};

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::length::LengthMode;
use crate::style::Overflow;
use crate::transform::checked_inverse;
use crate::tree::{MarkerVertex, NodeId, NodeKind, RenderTree, VertexRole, marker_vertices};

use super::kinds::{MarkerData, MarkerOrient, MarkerUnits, ResourceKind};

/// One marker drawn at one path vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerInstance {
    /// The marker container whose children are drawn.
    pub container: NodeId,
    /// Marker content coordinates to the shape's user space.
    pub transform: Affine,
    /// Clip in marker content coordinates, when the marker clips its
    /// overflow.
    pub clip: Option<Rect>,
}

/// Places one marker at a vertex.
///
/// `viewport` is the size marker lengths resolve against. Returns `None`
/// if the marker's viewport or view box is empty.
pub(crate) fn place_marker(
    data: &MarkerData,
    overflow: Overflow,
    viewport: Size,
    vertex: &MarkerVertex,
    stroke_width: f64,
) -> Option<(Affine, Option<Rect>)> {
    let size = Size::new(
        data.width.resolve(LengthMode::Width, viewport),
        data.height.resolve(LengthMode::Height, viewport),
    );
    if !(size.width > 0.0 && size.height > 0.0) {
        return None;
    }
    let view_box = match data.view_box {
        Some(vb) => data.par.view_box_transform(vb, size)?,
        None => Affine::IDENTITY,
    };
    let reference = view_box
        * Point::new(
            data.ref_x.resolve(LengthMode::Width, viewport),
            data.ref_y.resolve(LengthMode::Height, viewport),
        );
    let angle = match data.orient {
        MarkerOrient::Auto => vertex.angle,
        MarkerOrient::AutoStartReverse if vertex.role == VertexRole::Start => {
            vertex.angle + core::f64::consts::PI
        }
        MarkerOrient::AutoStartReverse => vertex.angle,
        MarkerOrient::Angle(degrees) => degrees.to_radians(),
    };
    let scale = match data.units {
        MarkerUnits::StrokeWidth => stroke_width,
        MarkerUnits::UserSpaceOnUse => 1.0,
    };
    let transform = Affine::translate(vertex.point.to_vec2())
        * Affine::rotate(angle)
        * Affine::scale(scale)
        * Affine::translate(-reference.to_vec2())
        * view_box;
    let clip = match overflow {
        Overflow::Visible => None,
        Overflow::Hidden => {
            let inverse = checked_inverse(view_box)?;
            Some(inverse.transform_rect_bbox(size.to_rect()))
        }
    };
    Some((transform, clip))
}

impl RenderTree {
    fn marker_data(&self, container: NodeId) -> Option<&MarkerData> {
        match &self.kind[container.idx as usize] {
            NodeKind::Resource(r) => match &r.kind {
                ResourceKind::Marker(m) => Some(m),
                _ => None,
            },
            _ => None,
        }
    }

    /// Places the shape's start, mid and end markers along `path`.
    pub(crate) fn marker_instances(
        &self,
        shape: u32,
        path: &BezPath,
        stroke_width: f64,
    ) -> Vec<MarkerInstance> {
        let Some(resources) = self.cache.get(shape) else {
            return Vec::new();
        };
        let (start, mid, end) = (
            resources.marker_start,
            resources.marker_mid,
            resources.marker_end,
        );
        if start.is_none() && mid.is_none() && end.is_none() {
            return Vec::new();
        }
        let mut out = Vec::new();
        for vertex in marker_vertices(path) {
            let container = match vertex.role {
                VertexRole::Start => start,
                VertexRole::Mid => mid,
                VertexRole::End => end,
            };
            let Some(container) = container else {
                continue;
            };
            let Some(data) = self.marker_data(container) else {
                continue;
            };
            let overflow = self.style[container.idx as usize].overflow;
            let viewport = self.viewport_size_of(container.idx);
            if let Some((transform, clip)) =
                place_marker(data, overflow, viewport, &vertex, stroke_width)
            {
                out.push(MarkerInstance {
                    container,
                    transform,
                    clip,
                });
            }
        }
        out
    }

    /// Returns the union of the markers' painted bounds in the shape's user
    /// space.
    pub(crate) fn marker_bounds(&self, markers: &[MarkerInstance]) -> Option<Rect> {
        let mut out: Option<Rect> = None;
        for m in markers {
            let Some(content) = self.stroke_bbox[m.container.idx as usize] else {
                continue;
            };
            let content = match m.clip {
                Some(clip) => content.intersect(clip),
                None => content,
            };
            if content.width() <= 0.0 && content.height() <= 0.0 {
                continue;
            }
            let b = m.transform.transform_rect_bbox(content);
            out = Some(out.map_or(b, |u| u.union(b)));
        }
        out
    }
}
