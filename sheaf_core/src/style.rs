// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The computed-style surface the render tree consumes.
//!
//! Style computation (cascade, inheritance, parsing) happens elsewhere; a
//! host hands each node a finished [`ComputedStyle`] through
//! [`RenderTree::set_style`](crate::tree::RenderTree::set_style). The tree
//! only reads it, and [`ComputedStyle::diff`] tells the tree how much work a
//! change implies.

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Cap, Join, Stroke};
use peniko::{Color, Fill, Mix};

use crate::length::{Length, LengthMode};

/// `display`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Display {
    /// Rendered.
    #[default]
    Inline,
    /// Not rendered; excluded from bounding boxes and hit testing.
    None,
}

/// `visibility`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Painted.
    #[default]
    Visible,
    /// Not painted, but still contributes geometry.
    Hidden,
    /// Treated like `hidden`.
    Collapse,
}

/// `isolation`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Isolation {
    /// Groups only when another property requires it.
    #[default]
    Auto,
    /// Always forms an isolated group.
    Isolate,
}

/// `mask-type`, read on the mask element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MaskType {
    /// Coverage is the luminance of the mask content.
    #[default]
    Luminance,
    /// Coverage is the alpha of the mask content.
    Alpha,
}

/// `pointer-events`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PointerEvents {
    /// Visible, and over a painted fill or stroke.
    #[default]
    VisiblePainted,
    /// Visible, and over the fill area.
    VisibleFill,
    /// Visible, and over the stroke area.
    VisibleStroke,
    /// Visible, and over fill or stroke area.
    Visible,
    /// Over a painted fill or stroke, regardless of visibility.
    Painted,
    /// Over the fill area, regardless of visibility or paint.
    Fill,
    /// Over the stroke area, regardless of visibility or paint.
    Stroke,
    /// Over fill or stroke area, regardless of visibility or paint.
    All,
    /// Never a hit target.
    None,
}

/// `vector-effect`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VectorEffect {
    /// Stroke scales with the current transform.
    #[default]
    None,
    /// Stroke width is in host pixels.
    NonScalingStroke,
}

/// `overflow`, read on viewport-establishing nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Overflow {
    /// Content outside the viewport is clipped.
    #[default]
    Hidden,
    /// Content may paint outside the viewport.
    Visible,
}

/// A `fill` or `stroke` value.
#[derive(Clone, Debug, Default)]
pub enum SvgPaint {
    /// No paint.
    #[default]
    None,
    /// A solid color.
    Color(Color),
    /// A paint server reference with an optional fallback color.
    Url {
        /// Target element id (without `#`).
        id: String,
        /// Color used when the reference does not resolve.
        fallback: Option<Color>,
    },
}

impl SvgPaint {
    /// Returns the referenced id, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Url { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Returns whether this paint draws anything when unresolved references
    /// fall back.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Color(a), Self::Color(b)) => a.components == b.components,
            (
                Self::Url { id: a, fallback: fa },
                Self::Url { id: b, fallback: fb },
            ) => a == b && same_color(*fa, *fb),
            _ => false,
        }
    }
}

fn same_color(a: Option<Color>, b: Option<Color>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.components == b.components,
        (None, None) => true,
        _ => false,
    }
}

/// A CSS basic shape, resolved against the client's object bounding box.
#[derive(Clone, Debug, PartialEq)]
pub enum BasicShape {
    /// `inset(top right bottom left round radius)`.
    Inset {
        /// Inset from the top edge.
        top: Length,
        /// Inset from the right edge.
        right: Length,
        /// Inset from the bottom edge.
        bottom: Length,
        /// Inset from the left edge.
        left: Length,
        /// Corner radius.
        round: Length,
    },
    /// `circle(r at cx cy)`.
    Circle {
        /// Center x.
        cx: Length,
        /// Center y.
        cy: Length,
        /// Radius.
        r: Length,
    },
    /// `ellipse(rx ry at cx cy)`.
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
    /// `polygon(fill-rule, x y, ...)`.
    Polygon {
        /// Winding rule.
        fill_rule: Fill,
        /// Vertices.
        points: Vec<(Length, Length)>,
    },
}

/// A `clip-path` value.
#[derive(Clone, Debug, PartialEq)]
pub enum ClipPathRef {
    /// `url(#id)` to a clipPath container.
    Url(String),
    /// An inline basic shape.
    Shape(BasicShape),
}

/// Stroke geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    /// `stroke-width`.
    pub width: Length,
    /// `stroke-linejoin`.
    pub join: Join,
    /// `stroke-linecap`.
    pub cap: Cap,
    /// `stroke-miterlimit`.
    pub miter_limit: f64,
    /// `stroke-dasharray`, in user units.
    pub dashes: Vec<f64>,
    /// `stroke-dashoffset`.
    pub dash_offset: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: Length::Number(1.0),
            join: Join::Miter,
            cap: Cap::Butt,
            miter_limit: 4.0,
            dashes: Vec::new(),
            dash_offset: 0.0,
        }
    }
}

impl StrokeStyle {
    /// Builds a [`kurbo::Stroke`] with the width resolved against `viewport`.
    #[must_use]
    pub fn to_kurbo(&self, viewport: kurbo::Size) -> Stroke {
        let stroke = Stroke::new(self.width.resolve(LengthMode::Other, viewport).max(0.0))
            .with_join(self.join)
            .with_caps(self.cap)
            .with_miter_limit(self.miter_limit);
        if self.dashes.iter().any(|d| *d > 0.0) {
            stroke.with_dashes(self.dash_offset, self.dashes.iter().copied())
        } else {
            stroke
        }
    }
}

/// An outline drawn in the outline paint phase around the node's visual
/// rect.
#[derive(Clone, Copy, Debug)]
pub struct Outline {
    /// Width in user units.
    pub width: f64,
    /// Color.
    pub color: Color,
}

/// How much work a style change implies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleDifference {
    /// Nothing observable changed.
    Equal,
    /// Only painting changed.
    Repaint,
    /// Geometry or resource references changed.
    Layout,
}

/// The computed style of one node.
#[derive(Clone, Debug)]
pub struct ComputedStyle {
    /// `display`.
    pub display: Display,
    /// `visibility`.
    pub visibility: Visibility,
    /// `opacity`.
    pub opacity: f32,
    /// `mix-blend-mode`.
    pub blend: Mix,
    /// `isolation`.
    pub isolation: Isolation,
    /// `clip-path`.
    pub clip_path: Option<ClipPathRef>,
    /// `clip-rule`, read on clipPath content.
    pub clip_rule: Fill,
    /// `mask` (`url(#id)` target).
    pub mask: Option<String>,
    /// `mask-type`, read on mask elements.
    pub mask_type: MaskType,
    /// `filter` (`url(#id)` target).
    pub filter: Option<String>,
    /// `fill`.
    pub fill: SvgPaint,
    /// `fill-opacity`.
    pub fill_opacity: f32,
    /// `fill-rule`.
    pub fill_rule: Fill,
    /// `stroke`.
    pub stroke: SvgPaint,
    /// `stroke-opacity`.
    pub stroke_opacity: f32,
    /// Stroke geometry.
    pub stroke_style: StrokeStyle,
    /// `vector-effect`.
    pub vector_effect: VectorEffect,
    /// `marker-start`.
    pub marker_start: Option<String>,
    /// `marker-mid`.
    pub marker_mid: Option<String>,
    /// `marker-end`.
    pub marker_end: Option<String>,
    /// `pointer-events`.
    pub pointer_events: PointerEvents,
    /// `overflow`.
    pub overflow: Overflow,
    /// `outline`.
    pub outline: Option<Outline>,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Inline,
            visibility: Visibility::Visible,
            opacity: 1.0,
            blend: Mix::Normal,
            isolation: Isolation::Auto,
            clip_path: None,
            clip_rule: Fill::NonZero,
            mask: None,
            mask_type: MaskType::Luminance,
            filter: None,
            fill: SvgPaint::Color(peniko::color::palette::css::BLACK),
            fill_opacity: 1.0,
            fill_rule: Fill::NonZero,
            stroke: SvgPaint::None,
            stroke_opacity: 1.0,
            stroke_style: StrokeStyle::default(),
            vector_effect: VectorEffect::None,
            marker_start: None,
            marker_mid: None,
            marker_end: None,
            pointer_events: PointerEvents::VisiblePainted,
            overflow: Overflow::Hidden,
            outline: None,
        }
    }
}

impl ComputedStyle {
    /// Returns whether the node takes part in rendering at all.
    #[inline]
    #[must_use]
    pub fn is_displayed(&self) -> bool {
        self.display != Display::None
    }

    /// Returns whether the node's own content is painted.
    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::Visible
    }

    /// Returns whether painting this node needs its own compositing layer.
    #[must_use]
    pub fn needs_compositing_layer(&self) -> bool {
        self.opacity < 1.0 || self.blend != Mix::Normal || self.isolation == Isolation::Isolate
    }

    /// Returns whether the node has a stroke that contributes geometry.
    #[must_use]
    pub fn has_stroke(&self) -> bool {
        !self.stroke.is_none() && !matches!(self.stroke_style.width, Length::Number(w) if w <= 0.0)
    }

    /// Returns whether any length in this style depends on the viewport.
    #[must_use]
    pub fn has_relative_lengths(&self) -> bool {
        self.stroke_style.width.is_relative()
    }

    /// Returns whether any resource reference is present.
    #[must_use]
    pub fn has_resource_references(&self) -> bool {
        matches!(self.clip_path, Some(ClipPathRef::Url(_)))
            || self.mask.is_some()
            || self.filter.is_some()
            || self.fill.url().is_some()
            || self.stroke.url().is_some()
            || self.marker_start.is_some()
            || self.marker_mid.is_some()
            || self.marker_end.is_some()
    }

    /// Classifies the change from `self` to `new`.
    #[must_use]
    pub fn diff(&self, new: &Self) -> StyleDifference {
        let layout = self.display != new.display
            || self.clip_path != new.clip_path
            || self.mask != new.mask
            || self.filter != new.filter
            || self.fill.url() != new.fill.url()
            || self.stroke.url() != new.stroke.url()
            || self.stroke.is_none() != new.stroke.is_none()
            || self.stroke_style != new.stroke_style
            || self.vector_effect != new.vector_effect
            || self.marker_start != new.marker_start
            || self.marker_mid != new.marker_mid
            || self.marker_end != new.marker_end
            || self.overflow != new.overflow;
        if layout {
            return StyleDifference::Layout;
        }
        let repaint = self.visibility != new.visibility
            || self.opacity != new.opacity
            || self.blend != new.blend
            || self.isolation != new.isolation
            || self.clip_rule != new.clip_rule
            || self.mask_type != new.mask_type
            || !self.fill.same(&new.fill)
            || self.fill_opacity != new.fill_opacity
            || self.fill_rule != new.fill_rule
            || !self.stroke.same(&new.stroke)
            || self.stroke_opacity != new.stroke_opacity
            || !same_outline(self.outline, new.outline);
        if repaint {
            StyleDifference::Repaint
        } else {
            StyleDifference::Equal
        }
    }
}

fn same_outline(a: Option<Outline>, b: Option<Outline>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.width == b.width && a.color.components == b.color.components,
        (None, None) => true,
        _ => false,
    }
}
