// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The paint traversal.
//!
//! Each node opens its effect scopes in a fixed order (compositing layer,
//! clip, mask, filter), draws its own content or recurses into its
//! children, and unwinds the scopes in reverse. If an effect cannot be
//! established the node is skipped for this phase, and whatever scopes were
//! already open are closed all the same.

use kurbo::{Affine, Stroke};
use peniko::{BlendMode, Fill};
use peniko::color::palette::css;
use sheaf_core::error::EffectError;
use sheaf_core::trace::{EffectKind, EffectOutcome, PhaseBeginEvent, PhaseEndEvent, PhaseKind, Tracer};
use sheaf_core::tree::{ImageKey, NodeGeometry, NodeId, NodeKind, PictureId, RenderTree};
use smallvec::SmallVec;

use crate::canvas::{Brush, Canvas, LayerStyle};
use crate::clipper::apply_clip;
use crate::context::{PaintContext, PaintStats};
use crate::filter::apply_filter;
use crate::marker::paint_markers;
use crate::masker::apply_mask;
use crate::paint_server::{PaintSlot, resolve_brush};
use crate::scope::UndoAction;

/// Which part of the content a traversal paints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PaintPhase {
    /// Fills, strokes, markers, images, text and foreign content.
    #[default]
    Foreground,
    /// Outlines around nodes whose style carries one.
    Outline,
}

/// Paints the subtree of `root` onto `canvas`.
///
/// The tree must have been laid out; nodes that never were are skipped.
/// `root` is painted in host space, whatever its depth in the tree.
pub fn paint(
    tree: &mut RenderTree,
    root: NodeId,
    canvas: &mut dyn Canvas,
    phase: PaintPhase,
) -> PaintStats {
    paint_with_tracer(tree, root, canvas, phase, &mut Tracer::none())
}

/// Like [`paint`], reporting effect outcomes to `tracer`.
pub fn paint_with_tracer(
    tree: &mut RenderTree,
    root: NodeId,
    canvas: &mut dyn Canvas,
    phase: PaintPhase,
    tracer: &mut Tracer<'_>,
) -> PaintStats {
    let pass_index = tree.pass_index();
    tracer.phase_begin(&PhaseBeginEvent {
        pass_index,
        phase: PhaseKind::Paint,
    });

    let base = tree
        .parent(root)
        .map_or(Affine::IDENTITY, |p| tree.local_to_host_transform(p));
    let stats = {
        let mut cx = PaintContext::new(tree, canvas, tracer);
        match phase {
            PaintPhase::Foreground => paint_node(&mut cx, root, base),
            PaintPhase::Outline => paint_outline(&mut cx, root, base),
        }
        debug_assert!(cx.scopes.is_empty(), "paint left scopes open");
        cx.release_stale_pictures();
        cx.stats
    };

    tracer.phase_end(&PhaseEndEvent {
        pass_index,
        phase: PhaseKind::Paint,
    });
    stats
}

/// Returns whether `node` takes part in painting at all.
fn is_paintable(tree: &RenderTree, node: NodeId) -> bool {
    tree.style(node).is_displayed()
        && !tree.kind(node).is_hidden_container()
        && tree.layout_flags(node).ever_laid_out
}

/// Paints one node, with its effects, in the space `base` maps from.
pub(crate) fn paint_node(cx: &mut PaintContext<'_, '_>, node: NodeId, base: Affine) {
    if !is_paintable(cx.tree, node) || cx.tree.style(node).opacity <= 0.0 {
        return;
    }
    let ctm = base * cx.tree.local_to_parent_transform(node);
    let mark = cx.mark();
    match establish_effects(cx, node, ctm) {
        Ok(()) => {
            draw_content(cx, node, ctm);
            cx.stats.painted += 1;
        }
        Err(e) => {
            log::debug!("{node:?} skipped: {e}");
            cx.stats.skipped += 1;
        }
    }
    cx.unwind_to(mark);
}

fn traced(
    cx: &mut PaintContext<'_, '_>,
    node: NodeId,
    effect: EffectKind,
    result: Result<Option<EffectOutcome>, EffectError>,
) -> Result<(), EffectError> {
    match result {
        Ok(Some(outcome)) => {
            cx.effect(node, effect, outcome);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => {
            cx.effect(node, effect, EffectOutcome::Failed(e));
            Err(e)
        }
    }
}

fn establish_effects(
    cx: &mut PaintContext<'_, '_>,
    node: NodeId,
    ctm: Affine,
) -> Result<(), EffectError> {
    let style = cx.tree.style(node);
    if style.needs_compositing_layer() {
        let layer = LayerStyle::Group {
            blend: BlendMode::from(style.blend),
            alpha: style.opacity,
        };
        let bounds = cx.tree.local_visual_rect(node);
        cx.canvas.push_layer(&layer, ctm, bounds);
        cx.push_undo(UndoAction::PopLayer);
        cx.effect(node, EffectKind::Compositing, EffectOutcome::Applied);
    }

    let clip = apply_clip(cx, node, ctm).map(|state| state.outcome());
    traced(cx, node, EffectKind::Clip, clip)?;
    let mask = apply_mask(cx, node, ctm).map(|applied| applied.then_some(EffectOutcome::Applied));
    traced(cx, node, EffectKind::Mask, mask)?;
    let filter =
        apply_filter(cx, node, ctm).map(|applied| applied.then_some(EffectOutcome::Applied));
    traced(cx, node, EffectKind::Filter, filter)
}

fn draw_content(cx: &mut PaintContext<'_, '_>, node: NodeId, ctm: Affine) {
    match cx.tree.kind(node) {
        NodeKind::Shape(_) => paint_shape(cx, node, ctm),
        NodeKind::Image(data) => {
            let image = data.image;
            paint_image(cx, node, ctm, image);
        }
        NodeKind::TextSpan(_) => paint_span(cx, node, ctm),
        NodeKind::ForeignObject(data) => {
            let content = data.content;
            paint_foreign_object(cx, node, ctm, content);
        }
        NodeKind::Root(_) | NodeKind::Viewport(_) | NodeKind::Group | NodeKind::Text(_) => {
            paint_children(cx, node, ctm);
        }
        NodeKind::HiddenContainer | NodeKind::Resource(_) => {}
    }
}

/// Opens the node's viewport clip. Returns `false` if the viewport is empty
/// and nothing inside it can be visible.
fn open_viewport_clip(cx: &mut PaintContext<'_, '_>, node: NodeId, ctm: Affine) -> bool {
    match cx.tree.viewport_clip(node) {
        Some(clip) if clip.width() <= 0.0 || clip.height() <= 0.0 => false,
        Some(clip) => {
            cx.canvas.push_clip_rect(ctm, clip);
            cx.push_undo(UndoAction::PopClip);
            true
        }
        None => true,
    }
}

/// Paints the children of `node` in tree order.
pub(crate) fn paint_children(cx: &mut PaintContext<'_, '_>, node: NodeId, ctm: Affine) {
    if !open_viewport_clip(cx, node, ctm) {
        return;
    }
    let children: SmallVec<[NodeId; 8]> = cx.tree.children(node).collect();
    for child in children {
        paint_node(cx, child, ctm);
    }
}

fn paint_shape(cx: &mut PaintContext<'_, '_>, node: NodeId, ctm: Affine) {
    let style = cx.tree.style(node);
    if !style.is_visible() {
        return;
    }
    let rule = style.fill_rule;
    let Some(layout) = cx.tree.geometry(node).as_shape() else {
        return;
    };
    let path = layout.path.clone();
    let stroke = layout.stroke.clone();
    let markers = layout.markers.clone();

    if let Some(brush) = resolve_brush(cx, node, PaintSlot::Fill) {
        cx.canvas.fill(ctm, rule, &brush, &path);
    }
    if let Some(stroke) = stroke {
        if let Some(brush) = resolve_brush(cx, node, PaintSlot::Stroke) {
            cx.canvas.stroke(ctm, &stroke, &brush, &path);
        }
    }
    paint_markers(cx, node, &markers, ctm);
}

fn paint_image(cx: &mut PaintContext<'_, '_>, node: NodeId, ctm: Affine, image: Option<ImageKey>) {
    let NodeGeometry::Image(placement) = *cx.tree.geometry(node) else {
        return;
    };
    let Some(image) = image else {
        return;
    };
    if !cx.tree.style(node).is_visible() {
        return;
    }
    let mark = cx.mark();
    if let Some(clip) = placement.clip {
        cx.canvas.push_clip_rect(ctm, clip);
        cx.push_undo(UndoAction::PopClip);
    }
    cx.canvas.draw_image(ctm, image, placement.dest);
    cx.unwind_to(mark);
}

fn paint_span(cx: &mut PaintContext<'_, '_>, node: NodeId, ctm: Affine) {
    if !cx.tree.style(node).is_visible() {
        return;
    }
    let (NodeKind::TextSpan(data), NodeGeometry::Span(span)) =
        (cx.tree.kind(node), cx.tree.geometry(node))
    else {
        return;
    };
    let text = data.text.clone();
    let span = *span;
    if let Some(brush) = resolve_brush(cx, node, PaintSlot::Fill) {
        cx.canvas
            .fill_text(ctm, span.origin, span.font_size, &text, &brush);
    }
}

fn paint_foreign_object(
    cx: &mut PaintContext<'_, '_>,
    node: NodeId,
    ctm: Affine,
    content: Option<PictureId>,
) {
    let Some(content) = content else {
        return;
    };
    if !cx.tree.style(node).is_visible() {
        return;
    }
    let mark = cx.mark();
    if open_viewport_clip(cx, node, ctm) {
        cx.canvas.draw_picture(ctm, content);
    }
    cx.unwind_to(mark);
}

// -- Outline phase --

fn paint_outline(cx: &mut PaintContext<'_, '_>, node: NodeId, base: Affine) {
    if !is_paintable(cx.tree, node) {
        return;
    }
    let ctm = base * cx.tree.local_to_parent_transform(node);
    let style = cx.tree.style(node);
    if let Some(outline) = style.outline.filter(|o| o.width > 0.0 && style.is_visible()) {
        let bounds = cx.tree.stroke_bounding_box(node);
        if bounds.width() > 0.0 || bounds.height() > 0.0 {
            let rect = bounds.inflate(outline.width / 2.0, outline.width / 2.0);
            cx.canvas.stroke(
                ctm,
                &Stroke::new(outline.width),
                &Brush::Solid(outline.color),
                &kurbo::Shape::to_path(&rect, 0.1),
            );
            cx.stats.painted += 1;
        }
    }
    if cx.tree.kind(node).is_container() {
        let children: SmallVec<[NodeId; 8]> = cx.tree.children(node).collect();
        for child in children {
            paint_outline(cx, child, ctm);
        }
    }
}

// -- Clip content --

/// Paints one clipPath child as coverage: its fill area in opaque black
/// under its `clip-rule`, clipped by its own clip-path.
pub(crate) fn paint_clip_content(cx: &mut PaintContext<'_, '_>, node: NodeId, base: Affine) {
    let style = cx.tree.style(node);
    if !style.is_displayed() || !style.is_visible() || !cx.tree.layout_flags(node).ever_laid_out {
        return;
    }
    let rule: Fill = style.clip_rule;
    let ctm = base * cx.tree.local_to_parent_transform(node);
    let mark = cx.mark();
    let clip = apply_clip(cx, node, ctm).map(|state| state.outcome());
    if traced(cx, node, EffectKind::Clip, clip).is_ok() {
        let coverage = Brush::Solid(css::BLACK);
        match cx.tree.kind(node) {
            NodeKind::Shape(_) => {
                if let Some(layout) = cx.tree.geometry(node).as_shape() {
                    let path = layout.path.clone();
                    cx.canvas.fill(ctm, rule, &coverage, &path);
                }
            }
            NodeKind::Text(_) => {
                let spans: SmallVec<[NodeId; 8]> = cx.tree.children(node).collect();
                for span in spans {
                    if let (NodeKind::TextSpan(data), NodeGeometry::Span(layout)) =
                        (cx.tree.kind(span), cx.tree.geometry(span))
                    {
                        let text = data.text.clone();
                        let layout = *layout;
                        cx.canvas
                            .fill_text(ctm, layout.origin, layout.font_size, &text, &coverage);
                    }
                }
            }
            _ => {}
        }
    }
    cx.unwind_to(mark);
}
