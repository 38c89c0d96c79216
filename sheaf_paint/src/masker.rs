// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Establishing `mask`.

use kurbo::Affine;
use peniko::BlendMode;
use sheaf_core::error::EffectError;
use sheaf_core::resource::MaskContent;
use sheaf_core::tree::{NodeId, PictureId};
use smallvec::SmallVec;

use crate::canvas::LayerStyle;
use crate::context::PaintContext;
use crate::painter::paint_node;
use crate::scope::UndoAction;

/// Opens the mask of `node`. Returns whether a mask was applied; an
/// unresolved reference paints the node unmasked.
pub(crate) fn apply_mask(
    cx: &mut PaintContext<'_, '_>,
    node: NodeId,
    ctm: Affine,
) -> Result<bool, EffectError> {
    if cx.tree.style(node).mask.is_none() {
        return Ok(false);
    }
    let Some(container) = cx.tree.resources(node).and_then(|r| r.masker) else {
        log::debug!("{node:?}: mask unresolved; painting unmasked");
        return Ok(false);
    };
    cx.acquire(container)?;
    let result = apply_mask_container(cx, node, container, ctm);
    cx.release(container);
    result
}

fn apply_mask_container(
    cx: &mut PaintContext<'_, '_>,
    node: NodeId,
    container: NodeId,
    ctm: Affine,
) -> Result<bool, EffectError> {
    let content = cx.tree.mask_content(container, node)?;
    let picture = match content.picture {
        Some(picture) => picture,
        None => record_mask(cx, container, node, &content),
    };
    let mode = cx.tree.style(container).mask_type;
    cx.canvas.push_layer(
        &LayerStyle::Group {
            blend: BlendMode::default(),
            alpha: 1.0,
        },
        ctm,
        content.region,
    );
    cx.push_undo(UndoAction::ApplyMask {
        picture,
        transform: ctm,
        bounds: content.region,
        mode,
    });
    Ok(true)
}

/// Records the mask's children, clipped to the mask region, in the
/// client's user space.
fn record_mask(
    cx: &mut PaintContext<'_, '_>,
    container: NodeId,
    client: NodeId,
    content: &MaskContent,
) -> PictureId {
    let recording = cx.begin_picture();
    let mark = cx.mark();
    cx.canvas.push_clip_rect(Affine::IDENTITY, content.region);
    cx.push_undo(UndoAction::PopClip);
    let children: SmallVec<[NodeId; 8]> = cx.tree.children(container).collect();
    for child in children {
        paint_node(cx, child, content.content_transform);
    }
    cx.unwind_to(mark);
    let (picture, cacheable) = cx.end_picture(recording);
    let cached = cacheable && cx.tree.set_client_picture(container, client, picture);
    cx.keep_picture(cached, picture);
    picture
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use kurbo::Rect;
    use sheaf_core::length::Units;
    use sheaf_core::resource::{MaskData, ResourceData, ResourceKind};
    use sheaf_core::style::{ComputedStyle, MaskType};
    use sheaf_core::tree::{NodeKind, RenderTree, RootData, ShapeGeometry};

    use crate::canvas::LayerStyle;
    use crate::painter::{PaintPhase, paint};
    use crate::recording::{Command, CommandKind, RecordingCanvas};

    fn masked(id: &str) -> ComputedStyle {
        ComputedStyle {
            mask: Some(id.to_string()),
            ..ComputedStyle::default()
        }
    }

    fn mask_doc(data: MaskData, mask_style: ComputedStyle, client: ShapeGeometry) -> RenderTree {
        let mut tree = RenderTree::new();
        let root = tree.create_node(NodeKind::Root(RootData::default()), ComputedStyle::default());
        let mask = tree.create_node(
            NodeKind::Resource(ResourceData::new("m", ResourceKind::Mask(data))),
            mask_style,
        );
        tree.append_child(root, mask);
        let content = tree.create_node(
            NodeKind::Shape(ShapeGeometry::rect(0.0, 0.0, 5.0, 5.0)),
            ComputedStyle::default(),
        );
        tree.append_child(mask, content);
        let client = tree.create_node(NodeKind::Shape(client), masked("m"));
        tree.append_child(root, client);
        let _ = tree.layout();
        tree
    }

    fn paint_all(tree: &mut RenderTree) -> RecordingCanvas {
        let root = tree.roots()[0];
        let mut canvas = RecordingCanvas::new();
        paint(tree, root, &mut canvas, PaintPhase::Foreground);
        assert!(canvas.is_balanced());
        canvas
    }

    #[test]
    fn mask_layer_uses_the_region_and_mask_type() {
        let mut tree = mask_doc(
            MaskData::default(),
            ComputedStyle {
                mask_type: MaskType::Alpha,
                ..ComputedStyle::default()
            },
            ShapeGeometry::rect(0.0, 0.0, 10.0, 10.0),
        );
        let canvas = paint_all(&mut tree);
        let layers: alloc::vec::Vec<_> = canvas
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::PushLayer { style, bounds, .. } => Some((style.clone(), *bounds)),
                _ => None,
            })
            .collect();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].1, Rect::new(-1.0, -1.0, 11.0, 11.0));
        assert_eq!(layers[1].0, LayerStyle::Mask(MaskType::Alpha));
    }

    #[test]
    fn mask_content_is_recorded_once_per_client() {
        let mut tree = mask_doc(
            MaskData::default(),
            ComputedStyle::default(),
            ShapeGeometry::rect(0.0, 0.0, 10.0, 10.0),
        );
        let first = paint_all(&mut tree);
        assert_eq!(first.picture_count(), 1);
        let Some(Command::DrawPicture { picture, .. }) = first
            .commands()
            .iter()
            .find(|c| c.kind() == CommandKind::DrawPicture)
        else {
            panic!("mask was not drawn");
        };
        let recorded = first.picture(*picture).unwrap();
        assert_eq!(recorded[0].kind(), CommandKind::PushClip, "clipped to the region");
        assert!(recorded.iter().any(|c| c.kind() == CommandKind::Fill));

        let second = paint_all(&mut tree);
        assert_eq!(second.picture_count(), 0, "replayed from the cache");
        assert_eq!(second.count(CommandKind::DrawPicture), 1);
    }

    #[test]
    fn empty_bbox_with_bbox_units_skips_the_client() {
        let mut tree = mask_doc(
            MaskData {
                units: Units::ObjectBoundingBox,
                ..MaskData::default()
            },
            ComputedStyle::default(),
            ShapeGeometry::rect(0.0, 0.0, 0.0, 10.0),
        );
        let canvas = paint_all(&mut tree);
        assert_eq!(canvas.count(CommandKind::Fill), 0);
        assert_eq!(canvas.count(CommandKind::PushLayer), 0);
    }

    #[test]
    fn unresolved_mask_paints_unmasked() {
        let mut tree = RenderTree::new();
        let root = tree.create_node(NodeKind::Root(RootData::default()), ComputedStyle::default());
        let client = tree.create_node(
            NodeKind::Shape(ShapeGeometry::rect(0.0, 0.0, 10.0, 10.0)),
            masked("nowhere"),
        );
        tree.append_child(root, client);
        let _ = tree.layout();
        let canvas = paint_all(&mut tree);
        assert_eq!(canvas.count(CommandKind::Fill), 1);
        assert_eq!(canvas.count(CommandKind::PushLayer), 0);
    }
}
