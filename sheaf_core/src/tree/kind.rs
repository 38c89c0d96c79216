// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The closed set of node kinds and their attribute payloads.

use kurbo::{Rect, Size};

use crate::length::{Length, LengthRect};
use crate::resource::{ResourceData, ResourceType};

use super::id::{ImageKey, PictureId};
use super::shape::ShapeGeometry;
use super::text::{TextData, TextSpanData};
use super::viewport::PreserveAspectRatio;

/// The outermost `<svg>`, hosted in a box of the surrounding layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootData {
    /// `width`; percentages resolve against the host content box.
    pub width: Length,
    /// `height`; percentages resolve against the host content box.
    pub height: Length,
    /// `viewBox`.
    pub view_box: Option<Rect>,
    /// `preserveAspectRatio`.
    pub par: PreserveAspectRatio,
}

impl Default for RootData {
    fn default() -> Self {
        Self {
            width: Length::Percent(100.0),
            height: Length::Percent(100.0),
            view_box: None,
            par: PreserveAspectRatio::default(),
        }
    }
}

/// A nested `<svg>` establishing a new viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportData {
    /// Placement in the parent's user space.
    pub rect: LengthRect,
    /// `viewBox`.
    pub view_box: Option<Rect>,
    /// `preserveAspectRatio`.
    pub par: PreserveAspectRatio,
}

impl Default for ViewportData {
    fn default() -> Self {
        Self {
            rect: LengthRect {
                x: Length::ZERO,
                y: Length::ZERO,
                width: Length::Percent(100.0),
                height: Length::Percent(100.0),
            },
            view_box: None,
            par: PreserveAspectRatio::default(),
        }
    }
}

/// `<image>`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageData {
    /// Viewport; a zero width or height falls back to the intrinsic size.
    pub rect: LengthRect,
    /// Intrinsic size of the decoded image, if known.
    pub intrinsic: Option<Size>,
    /// `preserveAspectRatio`.
    pub par: PreserveAspectRatio,
    /// Decoded image, if available.
    pub image: Option<ImageKey>,
}

/// `<foreignObject>`: a viewport of host-rendered content.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForeignObjectData {
    /// Viewport in the parent's user space.
    pub rect: LengthRect,
    /// Host-recorded content, if any.
    pub content: Option<PictureId>,
}

/// What a node is.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// Outermost `<svg>`.
    Root(RootData),
    /// Nested `<svg>`.
    Viewport(ViewportData),
    /// `<g>` and other plain containers.
    Group,
    /// `<defs>` and unrendered containers; children are laid out but never
    /// painted or aggregated.
    HiddenContainer,
    /// A basic shape or path.
    Shape(ShapeGeometry),
    /// `<image>`.
    Image(ImageData),
    /// `<text>`; its children are [`NodeKind::TextSpan`]s.
    Text(TextData),
    /// A run of text inside a [`NodeKind::Text`].
    TextSpan(TextSpanData),
    /// `<foreignObject>`.
    ForeignObject(ForeignObjectData),
    /// A resource container.
    Resource(ResourceData),
}

impl NodeKind {
    /// Returns whether the node can have children.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(
            self,
            Self::Root(_)
                | Self::Viewport(_)
                | Self::Group
                | Self::HiddenContainer
                | Self::Text(_)
                | Self::Resource(_)
        )
    }

    /// Returns whether the node is excluded from its parent's bounding boxes
    /// and from painting.
    #[must_use]
    pub const fn is_hidden_container(&self) -> bool {
        matches!(self, Self::HiddenContainer | Self::Resource(_))
    }

    /// Returns whether the node establishes a viewport for its children.
    #[must_use]
    pub const fn establishes_viewport(&self) -> bool {
        matches!(self, Self::Root(_) | Self::Viewport(_))
    }

    /// Returns the resource type, for resource containers.
    #[must_use]
    pub const fn resource_type(&self) -> Option<ResourceType> {
        match self {
            Self::Resource(r) => Some(r.kind.ty()),
            _ => None,
        }
    }

    /// Returns whether any geometry attribute is a percentage.
    #[must_use]
    pub fn has_relative_lengths(&self) -> bool {
        match self {
            Self::Root(_) | Self::Group | Self::HiddenContainer | Self::TextSpan(_) => false,
            Self::Viewport(v) => v.rect.is_relative(),
            Self::Shape(s) => s.has_relative_lengths(),
            Self::Image(i) => i.rect.is_relative(),
            Self::ForeignObject(f) => f.rect.is_relative(),
            Self::Text(t) => t.x.is_relative() || t.y.is_relative(),
            Self::Resource(r) => r.kind.has_relative_lengths(),
        }
    }

    /// Short name for diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Root(_) => "root",
            Self::Viewport(_) => "viewport",
            Self::Group => "group",
            Self::HiddenContainer => "hidden",
            Self::Shape(_) => "shape",
            Self::Image(_) => "image",
            Self::Text(_) => "text",
            Self::TextSpan(_) => "tspan",
            Self::ForeignObject(_) => "foreign-object",
            Self::Resource(_) => "resource",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ClipPathData, ResourceKind};

    #[test]
    fn container_classification() {
        assert!(NodeKind::Group.is_container());
        assert!(!NodeKind::Group.is_hidden_container());
        assert!(NodeKind::HiddenContainer.is_hidden_container());
        let clip = NodeKind::Resource(ResourceData::new(
            "c",
            ResourceKind::ClipPath(ClipPathData::default()),
        ));
        assert!(clip.is_hidden_container());
        assert_eq!(clip.resource_type(), Some(ResourceType::ClipPath));
        assert!(NodeKind::Root(RootData::default()).establishes_viewport());
    }

    #[test]
    fn percent_viewport_is_relative() {
        assert!(NodeKind::Viewport(ViewportData::default()).has_relative_lengths());
        let fixed = ViewportData {
            rect: LengthRect::numbers(0.0, 0.0, 10.0, 10.0),
            ..ViewportData::default()
        };
        assert!(!NodeKind::Viewport(fixed).has_relative_lengths());
    }
}
