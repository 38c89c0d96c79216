// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Establishing `clip-path`.
//!
//! A clip applies as a canvas clip path when its content allows it. When it
//! does not (text content, overlapping shapes with different rules, nested
//! clip-paths) the content is recorded once as a picture and applied as an
//! alpha mask over a group layer instead.

use kurbo::Affine;
use peniko::BlendMode;
use sheaf_core::error::EffectError;
use sheaf_core::resource::resolve_basic_shape;
use sheaf_core::style::{ClipPathRef, MaskType};
use sheaf_core::trace::EffectOutcome;
use sheaf_core::tree::{NodeId, PictureId};
use smallvec::SmallVec;

use crate::canvas::LayerStyle;
use crate::context::PaintContext;
use crate::painter::paint_clip_content;
use crate::scope::UndoAction;

/// How a node's clip was established.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClipState {
    /// No clip applies.
    #[default]
    NotApplied,
    /// A canvas clip path is open.
    AppliedPath,
    /// A group layer is open that the clip mask is composited onto.
    AppliedMask,
}

impl ClipState {
    /// Moves to `to`.
    ///
    /// # Panics
    ///
    /// Panics unless moving out of [`NotApplied`](Self::NotApplied) into an
    /// applied state; a clip is established at most once per node.
    #[must_use]
    pub fn transition(self, to: Self) -> Self {
        match (self, to) {
            (Self::NotApplied, Self::AppliedPath | Self::AppliedMask) => to,
            _ => panic!("illegal clip state transition {self:?} -> {to:?}"),
        }
    }

    pub(crate) fn outcome(self) -> Option<EffectOutcome> {
        match self {
            Self::NotApplied => None,
            Self::AppliedPath => Some(EffectOutcome::AppliedPath),
            Self::AppliedMask => Some(EffectOutcome::AppliedMask),
        }
    }
}

/// Opens the clip of `node`, whose user space maps to the canvas by `ctm`.
///
/// An unresolved reference leaves the node unclipped.
pub(crate) fn apply_clip(
    cx: &mut PaintContext<'_, '_>,
    node: NodeId,
    ctm: Affine,
) -> Result<ClipState, EffectError> {
    let state = ClipState::NotApplied;
    match cx.tree.style(node).clip_path.clone() {
        None => Ok(state),
        Some(ClipPathRef::Shape(shape)) => {
            let bbox = cx.tree.object_bounding_box(node);
            let (path, rule) =
                resolve_basic_shape(&shape, bbox).ok_or(EffectError::EmptyGeometry)?;
            cx.canvas.push_clip(ctm, &path, rule);
            cx.push_undo(UndoAction::PopClip);
            Ok(state.transition(ClipState::AppliedPath))
        }
        Some(ClipPathRef::Url(id)) => {
            let Some(container) = cx.tree.resources(node).and_then(|r| r.clipper) else {
                log::debug!("{node:?}: clip-path #{id} unresolved; painting unclipped");
                return Ok(state);
            };
            cx.acquire(container)?;
            let result = apply_clip_container(cx, node, container, ctm);
            cx.release(container);
            result
        }
    }
}

fn apply_clip_container(
    cx: &mut PaintContext<'_, '_>,
    node: NodeId,
    container: NodeId,
    ctm: Affine,
) -> Result<ClipState, EffectError> {
    let content = cx.tree.clip_content(container)?;
    let transform = ctm * cx.tree.clip_transform(container, node)?;
    let state = ClipState::NotApplied;

    if let Some(path) = &content.path {
        cx.canvas.push_clip(transform, path, content.fill_rule);
        cx.push_undo(UndoAction::PopClip);
        return Ok(state.transition(ClipState::AppliedPath));
    }

    let bounds = content
        .bounds
        .filter(|b| b.width() > 0.0 && b.height() > 0.0)
        .ok_or(EffectError::EmptyGeometry)?;
    let picture = match content.picture {
        Some(picture) => picture,
        None => record_clip_mask(cx, container)?,
    };
    cx.canvas.push_layer(
        &LayerStyle::Group {
            blend: BlendMode::default(),
            alpha: 1.0,
        },
        transform,
        bounds,
    );
    cx.push_undo(UndoAction::ApplyMask {
        picture,
        transform,
        bounds,
        mode: MaskType::Alpha,
    });
    Ok(state.transition(ClipState::AppliedMask))
}

/// Records the coverage of a clipPath's content, in its content space.
fn record_clip_mask(
    cx: &mut PaintContext<'_, '_>,
    container: NodeId,
) -> Result<PictureId, EffectError> {
    let recording = cx.begin_picture();
    let mark = cx.mark();
    let result = apply_clip(cx, container, Affine::IDENTITY).map(|_| {
        let children: SmallVec<[NodeId; 8]> = cx.tree.children(container).collect();
        for child in children {
            paint_clip_content(cx, child, Affine::IDENTITY);
        }
    });
    cx.unwind_to(mark);
    let (picture, cacheable) = cx.end_picture(recording);
    if let Err(e) = result {
        cx.keep_picture(false, picture);
        return Err(e);
    }
    let cached = cacheable && cx.tree.set_clip_picture(container, picture);
    cx.keep_picture(cached, picture);
    Ok(picture)
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use kurbo::Rect;
    use sheaf_core::length::{Length, Units};
    use sheaf_core::resource::{ClipPathData, ResourceData, ResourceKind};
    use sheaf_core::style::{BasicShape, ComputedStyle};
    use sheaf_core::trace::Tracer;
    use sheaf_core::tree::{NodeKind, RenderTree, RootData, ShapeGeometry};

    use super::*;
    use crate::recording::{Command, CommandKind, RecordingCanvas};

    struct Doc {
        tree: RenderTree,
        root: NodeId,
    }

    impl Doc {
        fn new() -> Self {
            let mut tree = RenderTree::new();
            let root =
                tree.create_node(NodeKind::Root(RootData::default()), ComputedStyle::default());
            Self { tree, root }
        }

        fn add(&mut self, parent: NodeId, kind: NodeKind, style: ComputedStyle) -> NodeId {
            let n = self.tree.create_node(kind, style);
            self.tree.append_child(parent, n);
            n
        }

        fn clip(&mut self, id: &str, units: Units, style: ComputedStyle) -> NodeId {
            let root = self.root;
            self.add(
                root,
                NodeKind::Resource(ResourceData::new(
                    id,
                    ResourceKind::ClipPath(ClipPathData { units }),
                )),
                style,
            )
        }

        fn rect(&mut self, parent: NodeId, r: Rect, style: ComputedStyle) -> NodeId {
            self.add(
                parent,
                NodeKind::Shape(ShapeGeometry::rect(r.x0, r.y0, r.width(), r.height())),
                style,
            )
        }

        /// Applies the clip of `node` and unwinds it again.
        fn apply(&mut self, node: NodeId) -> (Result<ClipState, EffectError>, RecordingCanvas) {
            let _ = self.tree.layout();
            let mut canvas = RecordingCanvas::new();
            let mut tracer = Tracer::none();
            let result = {
                let mut cx = PaintContext::new(&mut self.tree, &mut canvas, &mut tracer);
                let mark = cx.mark();
                let result = apply_clip(&mut cx, node, Affine::IDENTITY);
                cx.unwind_to(mark);
                assert!(cx.active.is_empty());
                result
            };
            (result, canvas)
        }
    }

    fn clipped_by(id: &str) -> ComputedStyle {
        ComputedStyle {
            clip_path: Some(ClipPathRef::Url(id.to_string())),
            ..ComputedStyle::default()
        }
    }

    #[test]
    fn only_the_first_transition_is_legal() {
        let s = ClipState::NotApplied.transition(ClipState::AppliedMask);
        assert_eq!(s, ClipState::AppliedMask);
        assert_eq!(s.outcome(), Some(EffectOutcome::AppliedMask));
        assert_eq!(ClipState::NotApplied.outcome(), None);
    }

    #[test]
    #[should_panic(expected = "illegal clip state transition")]
    fn reapplying_a_clip_panics() {
        let _ = ClipState::AppliedPath.transition(ClipState::AppliedMask);
    }

    #[test]
    #[should_panic(expected = "illegal clip state transition")]
    fn returning_to_not_applied_panics() {
        let _ = ClipState::AppliedPath.transition(ClipState::NotApplied);
    }

    #[test]
    fn bbox_clip_with_one_rect_is_a_path() {
        let mut doc = Doc::new();
        let clip = doc.clip("c", Units::ObjectBoundingBox, ComputedStyle::default());
        doc.rect(clip, Rect::new(0.0, 0.0, 1.0, 1.0), ComputedStyle::default());
        let root = doc.root;
        let target = doc.rect(root, Rect::new(0.0, 0.0, 50.0, 50.0), clipped_by("c"));

        let (result, canvas) = doc.apply(target);
        assert_eq!(result, Ok(ClipState::AppliedPath));
        let Command::PushClip { transform, path, .. } = &canvas.commands()[0] else {
            panic!("expected a clip path, got {:?}", canvas.commands());
        };
        let bounds = transform.transform_rect_bbox(kurbo::Shape::bounding_box(path));
        assert_eq!(bounds, Rect::new(0.0, 0.0, 50.0, 50.0));
        assert!(canvas.is_balanced());
    }

    #[test]
    fn basic_shape_clips_against_the_bbox() {
        let mut doc = Doc::new();
        let root = doc.root;
        let target = doc.rect(
            root,
            Rect::new(10.0, 10.0, 30.0, 30.0),
            ComputedStyle {
                clip_path: Some(ClipPathRef::Shape(BasicShape::Inset {
                    top: Length::Number(5.0),
                    right: Length::Number(5.0),
                    bottom: Length::Number(5.0),
                    left: Length::Number(5.0),
                    round: Length::ZERO,
                })),
                ..ComputedStyle::default()
            },
        );
        let (result, canvas) = doc.apply(target);
        assert_eq!(result, Ok(ClipState::AppliedPath));
        assert_eq!(canvas.count(CommandKind::PushClip), 1);
    }

    #[test]
    fn degenerate_basic_shape_is_empty_geometry() {
        let mut doc = Doc::new();
        let root = doc.root;
        let target = doc.rect(
            root,
            Rect::new(0.0, 0.0, 10.0, 10.0),
            ComputedStyle {
                clip_path: Some(ClipPathRef::Shape(BasicShape::Circle {
                    cx: Length::Percent(50.0),
                    cy: Length::Percent(50.0),
                    r: Length::ZERO,
                })),
                ..ComputedStyle::default()
            },
        );
        let (result, canvas) = doc.apply(target);
        assert_eq!(result, Err(EffectError::EmptyGeometry));
        assert!(canvas.commands().is_empty());
    }

    #[test]
    fn unresolved_reference_is_not_applied() {
        let mut doc = Doc::new();
        let root = doc.root;
        let target = doc.rect(root, Rect::new(0.0, 0.0, 10.0, 10.0), clipped_by("missing"));
        let (result, canvas) = doc.apply(target);
        assert_eq!(result, Ok(ClipState::NotApplied));
        assert!(canvas.commands().is_empty());
    }

    #[test]
    fn overlapping_content_falls_back_to_a_mask() {
        let mut doc = Doc::new();
        let clip = doc.clip("c", Units::UserSpaceOnUse, ComputedStyle::default());
        doc.rect(clip, Rect::new(0.0, 0.0, 20.0, 20.0), ComputedStyle::default());
        doc.rect(
            clip,
            Rect::new(10.0, 10.0, 30.0, 30.0),
            ComputedStyle {
                clip_rule: peniko::Fill::EvenOdd,
                ..ComputedStyle::default()
            },
        );
        let root = doc.root;
        let target = doc.rect(root, Rect::new(0.0, 0.0, 50.0, 50.0), clipped_by("c"));

        let (result, canvas) = doc.apply(target);
        assert_eq!(result, Ok(ClipState::AppliedMask));
        assert!(canvas.is_balanced());
        let Some(Command::DrawPicture { picture, .. }) = canvas
            .commands()
            .iter()
            .find(|c| c.kind() == CommandKind::DrawPicture)
        else {
            panic!("mask picture was not drawn");
        };
        let fills: vec::Vec<_> = canvas
            .picture(*picture)
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                Command::Fill { rule, .. } => Some(*rule),
                _ => None,
            })
            .collect();
        assert_eq!(fills, [peniko::Fill::NonZero, peniko::Fill::EvenOdd]);
        assert!(doc.tree.has_cached_artifact(clip, target));
    }

    #[test]
    fn masked_clip_without_content_is_empty_geometry() {
        let mut doc = Doc::new();
        let clip = doc.clip(
            "c",
            Units::UserSpaceOnUse,
            ComputedStyle {
                clip_path: Some(ClipPathRef::Shape(BasicShape::Circle {
                    cx: Length::ZERO,
                    cy: Length::ZERO,
                    r: Length::Number(5.0),
                })),
                ..ComputedStyle::default()
            },
        );
        let root = doc.root;
        let target = doc.rect(root, Rect::new(0.0, 0.0, 50.0, 50.0), clipped_by("c"));
        let (result, canvas) = doc.apply(target);
        assert!(doc.tree.resources(clip).is_none());
        assert_eq!(result, Err(EffectError::EmptyGeometry));
        assert!(canvas.is_balanced());
    }

    #[test]
    fn self_referencing_clip_is_a_cycle() {
        let mut doc = Doc::new();
        let clip = doc.clip("c", Units::UserSpaceOnUse, clipped_by("c"));
        doc.rect(clip, Rect::new(0.0, 0.0, 20.0, 20.0), ComputedStyle::default());
        let root = doc.root;
        let target = doc.rect(root, Rect::new(0.0, 0.0, 50.0, 50.0), clipped_by("c"));
        let (result, canvas) = doc.apply(target);
        assert_eq!(result, Err(EffectError::ReferenceCycle(clip)));
        assert!(canvas.is_balanced());
        assert_eq!(canvas.count(CommandKind::PushLayer), 0);
    }
}
