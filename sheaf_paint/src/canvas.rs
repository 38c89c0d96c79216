// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The raster backend contract.
//!
//! Painters never rasterize anything themselves. They describe each node as
//! a sequence of calls on a [`Canvas`]: clip and layer scopes, fills and
//! strokes with a [`Brush`], and recorded pictures. Every `push_*` call is
//! matched by the corresponding `pop_*` call, including on paths where an
//! effect fails part-way through.

use alloc::vec::Vec;

use kurbo::{Affine, BezPath, Point, Rect, Shape as _, Stroke};
use peniko::{BlendMode, Color, Fill};
use sheaf_core::resource::{FilterPrimitive, GradientShader};
use sheaf_core::style::MaskType;
use sheaf_core::tree::{ImageKey, PictureId};

/// What a fill or stroke is painted with.
#[derive(Clone, Debug)]
pub enum Brush {
    /// A solid color, opacity already applied.
    Solid(Color),
    /// A gradient shader.
    Gradient {
        /// The resolved shader; its transform maps shader space to the
        /// painted node's user space.
        shader: GradientShader,
        /// Opacity multiplied into every stop.
        alpha: f32,
    },
    /// A repeating tile of recorded content.
    Pattern {
        /// The tile rectangle in pattern space.
        tile: Rect,
        /// Pattern space to the painted node's user space.
        transform: Affine,
        /// Recorded tile content, in pattern space.
        picture: PictureId,
        /// Opacity of the whole tile.
        alpha: f32,
    },
}

/// How a layer is composited onto what lies beneath it when it is popped.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerStyle {
    /// A transparency group.
    Group {
        /// Blend mode against the backdrop.
        blend: BlendMode,
        /// Group opacity.
        alpha: f32,
    },
    /// The layer's content is a mask: the layer below keeps only as much of
    /// itself as the mask covers (destination-in).
    Mask(MaskType),
    /// The layer's content is run through a filter chain.
    Filter(Vec<FilterPrimitive>),
}

/// A raster or display-list backend.
pub trait Canvas {
    /// Intersects the clip with `path`, given in the space `transform`
    /// maps from.
    fn push_clip(&mut self, transform: Affine, path: &BezPath, rule: Fill);

    /// Intersects the clip with a rectangle.
    fn push_clip_rect(&mut self, transform: Affine, rect: Rect) {
        self.push_clip(transform, &rect.to_path(0.1), Fill::NonZero);
    }

    /// Ends the innermost clip.
    fn pop_clip(&mut self);

    /// Begins a layer covering `bounds` (in the space `transform` maps
    /// from).
    fn push_layer(&mut self, style: &LayerStyle, transform: Affine, bounds: Rect);

    /// Composites the innermost layer according to its [`LayerStyle`].
    fn pop_layer(&mut self);

    /// Fills `path`.
    fn fill(&mut self, transform: Affine, rule: Fill, brush: &Brush, path: &BezPath);

    /// Strokes `path`.
    fn stroke(&mut self, transform: Affine, stroke: &Stroke, brush: &Brush, path: &BezPath);

    /// Fills a run of text with its pen at `origin` on the baseline.
    fn fill_text(&mut self, transform: Affine, origin: Point, font_size: f64, text: &str, brush: &Brush);

    /// Draws a decoded image stretched to `dest`.
    fn draw_image(&mut self, transform: Affine, image: ImageKey, dest: Rect);

    /// Starts recording a picture. Until the matching
    /// [`end_picture`](Self::end_picture), calls are recorded rather than
    /// drawn.
    fn begin_picture(&mut self);

    /// Finishes the innermost recording.
    fn end_picture(&mut self) -> PictureId;

    /// Replays a recorded picture.
    fn draw_picture(&mut self, transform: Affine, picture: PictureId);

    /// Frees a picture no cache refers to any more.
    fn release_picture(&mut self, picture: PictureId);
}
