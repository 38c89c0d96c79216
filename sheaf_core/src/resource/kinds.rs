// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attribute payloads of resource containers.
//!
//! Pattern and gradient attributes are `Option`s because an unset attribute
//! is inherited through the `href` chain; the resolved values come from
//! [`RenderTree::resolve_pattern`](crate::tree::RenderTree::resolve_pattern)
//! and [`RenderTree::resolve_gradient`](crate::tree::RenderTree::resolve_gradient).

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Affine, Rect};
use peniko::{Color, Extend};

use crate::length::{Length, LengthRect, Units};
use crate::tree::PreserveAspectRatio;

/// The kind of a resource container, without payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// `<clipPath>`.
    ClipPath,
    /// `<mask>`.
    Mask,
    /// `<pattern>`.
    Pattern,
    /// `<linearGradient>`.
    LinearGradient,
    /// `<radialGradient>`.
    RadialGradient,
    /// `<filter>`.
    Filter,
    /// `<marker>`.
    Marker,
}

impl ResourceType {
    /// Returns whether this type can be used as a fill or stroke.
    #[must_use]
    pub const fn is_paint_server(self) -> bool {
        matches!(
            self,
            Self::Pattern | Self::LinearGradient | Self::RadialGradient
        )
    }

    /// Returns whether this type is a gradient.
    #[must_use]
    pub const fn is_gradient(self) -> bool {
        matches!(self, Self::LinearGradient | Self::RadialGradient)
    }

    /// Returns whether a container of this type may `href` one of `other`.
    #[must_use]
    pub const fn can_inherit_from(self, other: Self) -> bool {
        match self {
            Self::Pattern => matches!(other, Self::Pattern),
            Self::LinearGradient | Self::RadialGradient => other.is_gradient(),
            _ => false,
        }
    }
}

/// `<clipPath>` attributes. The `transform` attribute is the node's
/// transform.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClipPathData {
    /// `clipPathUnits`.
    pub units: Units,
}

/// `<mask>` attributes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaskData {
    /// `maskUnits`, governing the region.
    pub units: Units,
    /// `maskContentUnits`, governing the content.
    pub content_units: Units,
    /// `x`/`y`/`width`/`height`.
    pub region: LengthRect,
}

impl Default for MaskData {
    fn default() -> Self {
        Self {
            units: Units::ObjectBoundingBox,
            content_units: Units::UserSpaceOnUse,
            region: LengthRect::DEFAULT_EFFECT_REGION,
        }
    }
}

/// `<pattern>` attributes; `None` inherits through `href`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PatternData {
    /// `patternUnits` (default objectBoundingBox).
    pub units: Option<Units>,
    /// `patternContentUnits` (default userSpaceOnUse).
    pub content_units: Option<Units>,
    /// Tile rectangle (default all zero).
    pub region: Option<LengthRect>,
    /// `viewBox`.
    pub view_box: Option<Rect>,
    /// `preserveAspectRatio`.
    pub par: Option<PreserveAspectRatio>,
    /// `patternTransform`.
    pub transform: Option<Affine>,
    /// `href` target id.
    pub href: Option<String>,
}

/// One gradient stop.
#[derive(Clone, Copy, Debug)]
pub struct GradientStop {
    /// Offset in `[0, 1]`.
    pub offset: f32,
    /// Color, with `stop-opacity` already applied.
    pub color: Color,
}

/// Attributes shared by both gradient kinds; `None` inherits through `href`.
#[derive(Clone, Debug, Default)]
pub struct GradientData {
    /// `gradientUnits` (default objectBoundingBox).
    pub units: Option<Units>,
    /// `gradientTransform`.
    pub transform: Option<Affine>,
    /// `spreadMethod`.
    pub spread: Option<Extend>,
    /// Stops; an empty list inherits.
    pub stops: Vec<GradientStop>,
    /// `href` target id.
    pub href: Option<String>,
}

/// `<linearGradient>` attributes.
#[derive(Clone, Debug, Default)]
pub struct LinearGradientData {
    /// Shared attributes.
    pub common: GradientData,
    /// `x1` (default 0%).
    pub x1: Option<Length>,
    /// `y1` (default 0%).
    pub y1: Option<Length>,
    /// `x2` (default 100%).
    pub x2: Option<Length>,
    /// `y2` (default 0%).
    pub y2: Option<Length>,
}

/// `<radialGradient>` attributes.
#[derive(Clone, Debug, Default)]
pub struct RadialGradientData {
    /// Shared attributes.
    pub common: GradientData,
    /// `cx` (default 50%).
    pub cx: Option<Length>,
    /// `cy` (default 50%).
    pub cy: Option<Length>,
    /// `r` (default 50%).
    pub r: Option<Length>,
    /// `fx` (default `cx`).
    pub fx: Option<Length>,
    /// `fy` (default `cy`).
    pub fy: Option<Length>,
}

/// An opaque filter primitive, passed through to the paint backend.
#[derive(Clone, Copy, Debug)]
pub enum FilterPrimitive {
    /// `feGaussianBlur`.
    GaussianBlur {
        /// Horizontal standard deviation.
        std_dev_x: f64,
        /// Vertical standard deviation.
        std_dev_y: f64,
    },
    /// `feOffset`.
    Offset {
        /// Horizontal offset.
        dx: f64,
        /// Vertical offset.
        dy: f64,
    },
    /// `feFlood`.
    Flood {
        /// Flood color with opacity applied.
        color: Color,
    },
    /// Any other primitive, identified by a host-defined code.
    Other(u32),
}

/// `<filter>` attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterData {
    /// `filterUnits`, governing the region.
    pub units: Units,
    /// `primitiveUnits`.
    pub primitive_units: Units,
    /// `x`/`y`/`width`/`height`.
    pub region: LengthRect,
    /// Primitive chain; empty disables rendering of the client.
    pub primitives: Vec<FilterPrimitive>,
}

impl Default for FilterData {
    fn default() -> Self {
        Self {
            units: Units::ObjectBoundingBox,
            primitive_units: Units::UserSpaceOnUse,
            region: LengthRect::DEFAULT_EFFECT_REGION,
            primitives: Vec::new(),
        }
    }
}

impl PartialEq for FilterPrimitive {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::GaussianBlur {
                    std_dev_x: a,
                    std_dev_y: b,
                },
                Self::GaussianBlur {
                    std_dev_x: c,
                    std_dev_y: d,
                },
            ) => a == c && b == d,
            (Self::Offset { dx: a, dy: b }, Self::Offset { dx: c, dy: d }) => a == c && b == d,
            (Self::Flood { color: a }, Self::Flood { color: b }) => a.components == b.components,
            (Self::Other(a), Self::Other(b)) => a == b,
            _ => false,
        }
    }
}

/// `markerUnits`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MarkerUnits {
    /// Scaled by the client's stroke width.
    #[default]
    StrokeWidth,
    /// In the client's user space.
    UserSpaceOnUse,
}

/// `orient`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MarkerOrient {
    /// Along the path direction.
    Auto,
    /// Along the path direction, reversed at the start.
    AutoStartReverse,
    /// A fixed angle in degrees.
    Angle(f64),
}

impl Default for MarkerOrient {
    fn default() -> Self {
        Self::Angle(0.0)
    }
}

/// `<marker>` attributes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerData {
    /// `refX`.
    pub ref_x: Length,
    /// `refY`.
    pub ref_y: Length,
    /// `markerWidth` (default 3).
    pub width: Length,
    /// `markerHeight` (default 3).
    pub height: Length,
    /// `markerUnits`.
    pub units: MarkerUnits,
    /// `orient`.
    pub orient: MarkerOrient,
    /// `viewBox`.
    pub view_box: Option<Rect>,
    /// `preserveAspectRatio`.
    pub par: PreserveAspectRatio,
}

impl Default for MarkerData {
    fn default() -> Self {
        Self {
            ref_x: Length::ZERO,
            ref_y: Length::ZERO,
            width: Length::Number(3.0),
            height: Length::Number(3.0),
            units: MarkerUnits::StrokeWidth,
            orient: MarkerOrient::default(),
            view_box: None,
            par: PreserveAspectRatio::default(),
        }
    }
}

/// A resource container's attributes.
#[derive(Clone, Debug)]
pub enum ResourceKind {
    /// `<clipPath>`.
    ClipPath(ClipPathData),
    /// `<mask>`.
    Mask(MaskData),
    /// `<pattern>`.
    Pattern(PatternData),
    /// `<linearGradient>`.
    LinearGradient(LinearGradientData),
    /// `<radialGradient>`.
    RadialGradient(RadialGradientData),
    /// `<filter>`.
    Filter(FilterData),
    /// `<marker>`.
    Marker(MarkerData),
}

impl ResourceKind {
    /// Returns the payload-free type.
    #[must_use]
    pub const fn ty(&self) -> ResourceType {
        match self {
            Self::ClipPath(_) => ResourceType::ClipPath,
            Self::Mask(_) => ResourceType::Mask,
            Self::Pattern(_) => ResourceType::Pattern,
            Self::LinearGradient(_) => ResourceType::LinearGradient,
            Self::RadialGradient(_) => ResourceType::RadialGradient,
            Self::Filter(_) => ResourceType::Filter,
            Self::Marker(_) => ResourceType::Marker,
        }
    }

    /// Returns the `href` target, for kinds that inherit.
    #[must_use]
    pub fn href(&self) -> Option<&str> {
        match self {
            Self::Pattern(p) => p.href.as_deref(),
            Self::LinearGradient(g) => g.common.href.as_deref(),
            Self::RadialGradient(g) => g.common.href.as_deref(),
            _ => None,
        }
    }

    /// Returns whether any geometry attribute is a percentage.
    #[must_use]
    pub fn has_relative_lengths(&self) -> bool {
        match self {
            Self::Mask(m) => m.units == Units::UserSpaceOnUse && m.region.is_relative(),
            Self::Filter(f) => f.units == Units::UserSpaceOnUse && f.region.is_relative(),
            Self::Pattern(p) => p.region.is_some_and(|r| r.is_relative()),
            Self::Marker(m) => {
                m.width.is_relative()
                    || m.height.is_relative()
                    || m.ref_x.is_relative()
                    || m.ref_y.is_relative()
            }
            Self::ClipPath(_) | Self::LinearGradient(_) | Self::RadialGradient(_) => false,
        }
    }
}

/// Payload of [`NodeKind::Resource`](crate::tree::NodeKind::Resource).
#[derive(Clone, Debug)]
pub struct ResourceData {
    /// The element `id` the container registers under.
    pub id: String,
    /// Attributes.
    pub kind: ResourceKind,
}

impl ResourceData {
    /// Creates a resource payload.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inheritance_rules() {
        assert!(ResourceType::Pattern.can_inherit_from(ResourceType::Pattern));
        assert!(!ResourceType::Pattern.can_inherit_from(ResourceType::LinearGradient));
        assert!(ResourceType::RadialGradient.can_inherit_from(ResourceType::LinearGradient));
        assert!(!ResourceType::Mask.can_inherit_from(ResourceType::Mask));
    }

    #[test]
    fn effect_regions_default_to_bbox_outset() {
        let m = MaskData::default();
        assert_eq!(m.units, Units::ObjectBoundingBox);
        assert_eq!(m.region, LengthRect::DEFAULT_EFFECT_REGION);
        let f = FilterData::default();
        assert_eq!(f.region, LengthRect::DEFAULT_EFFECT_REGION);
        assert!(f.primitives.is_empty());
    }

    #[test]
    fn user_space_percent_region_is_relative() {
        let kind = ResourceKind::Mask(MaskData {
            units: Units::UserSpaceOnUse,
            ..MaskData::default()
        });
        assert!(kind.has_relative_lengths());
        assert!(!ResourceKind::Mask(MaskData::default()).has_relative_lengths());
    }
}
