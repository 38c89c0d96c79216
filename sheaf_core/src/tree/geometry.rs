// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-kind geometry computed by layout and consumed by paint and hit testing.

use alloc::vec::Vec;

use kurbo::{BezPath, Point, Rect, Stroke};

use crate::resource::MarkerInstance;

/// A laid-out shape.
#[derive(Clone, Debug)]
pub struct ShapeLayout {
    /// Fill geometry in the shape's user space.
    pub path: BezPath,
    /// Resolved stroke, if the shape strokes.
    ///
    /// For `vector-effect: non-scaling-stroke` the width is already divided by
    /// the screen scaling factor.
    pub stroke: Option<Stroke>,
    /// Marker instances, in paint order.
    pub markers: Vec<MarkerInstance>,
}

/// Where an image's pixels land in its viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImagePlacement {
    /// Destination of the full image.
    pub dest: Rect,
    /// Viewport clip, present when `slice` overflows the viewport.
    pub clip: Option<Rect>,
}

/// A measured text run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpanLayout {
    /// Pen origin on the baseline.
    pub origin: Point,
    /// Font size after device-pixel rounding, in user units.
    pub font_size: f64,
}

/// Kind-specific layout output.
#[derive(Clone, Debug, Default)]
pub enum NodeGeometry {
    /// Nothing beyond the bounding boxes (containers, degenerate nodes, nodes
    /// that were never laid out).
    #[default]
    None,
    /// See [`ShapeLayout`].
    Shape(ShapeLayout),
    /// See [`ImagePlacement`].
    Image(ImagePlacement),
    /// See [`SpanLayout`].
    Span(SpanLayout),
}

impl NodeGeometry {
    /// Returns the shape layout, if this is a shape.
    #[must_use]
    pub fn as_shape(&self) -> Option<&ShapeLayout> {
        match self {
            Self::Shape(s) => Some(s),
            _ => None,
        }
    }
}
