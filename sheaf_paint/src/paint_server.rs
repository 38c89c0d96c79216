// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resolving fill and stroke paint into a [`Brush`].

use kurbo::Affine;
use sheaf_core::error::EffectError;
use sheaf_core::resource::PatternTile;
use sheaf_core::style::SvgPaint;
use sheaf_core::trace::{EffectKind, EffectOutcome};
use sheaf_core::tree::{NodeId, PictureId};
use smallvec::SmallVec;

use crate::canvas::Brush;
use crate::context::PaintContext;
use crate::painter::paint_node;
use crate::scope::UndoAction;

/// Which paint of a node to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaintSlot {
    /// `fill`.
    Fill,
    /// `stroke`.
    Stroke,
}

/// Returns the brush for one paint of `node`, or `None` if nothing is
/// painted.
///
/// A paint server that cannot be used falls back to the paint's fallback
/// color, if it has one.
pub(crate) fn resolve_brush(
    cx: &mut PaintContext<'_, '_>,
    node: NodeId,
    slot: PaintSlot,
) -> Option<Brush> {
    let style = cx.tree.style(node);
    let (paint, opacity) = match slot {
        PaintSlot::Fill => (&style.fill, style.fill_opacity),
        PaintSlot::Stroke => (&style.stroke, style.stroke_opacity),
    };
    let (id, fallback) = match paint {
        SvgPaint::None => return None,
        SvgPaint::Color(color) => return Some(Brush::Solid(color.multiply_alpha(opacity))),
        SvgPaint::Url { id, fallback } => (id.clone(), *fallback),
    };
    let fallback = fallback.map(|c| Brush::Solid(c.multiply_alpha(opacity)));

    let server = cx.tree.resources(node).and_then(|r| match slot {
        PaintSlot::Fill => r.fill,
        PaintSlot::Stroke => r.stroke,
    });
    let Some(server) = server else {
        log::debug!("{node:?}: paint server #{id} unresolved");
        return fallback;
    };
    match server_brush(cx, node, server, opacity) {
        Ok(brush) => {
            cx.effect(node, EffectKind::PaintServer, EffectOutcome::Applied);
            Some(brush)
        }
        Err(e) => {
            cx.effect(node, EffectKind::PaintServer, EffectOutcome::Failed(e));
            fallback
        }
    }
}

fn server_brush(
    cx: &mut PaintContext<'_, '_>,
    node: NodeId,
    server: NodeId,
    opacity: f32,
) -> Result<Brush, EffectError> {
    let ty = cx
        .tree
        .kind(server)
        .resource_type()
        .ok_or(EffectError::MissingResource)?;
    if ty.is_gradient() {
        let shader = cx.tree.gradient_shader(server, node)?;
        return Ok(Brush::Gradient {
            shader,
            alpha: opacity,
        });
    }
    cx.acquire(server)?;
    let result = cx.tree.pattern_tile(server, node).map(|tile| {
        let picture = match tile.picture {
            Some(picture) => picture,
            None => record_tile(cx, server, node, &tile),
        };
        Brush::Pattern {
            tile: tile.tile,
            transform: tile.transform,
            picture,
            alpha: opacity,
        }
    });
    cx.release(server);
    result
}

/// Records one tile of pattern content, in pattern space.
fn record_tile(
    cx: &mut PaintContext<'_, '_>,
    pattern: NodeId,
    client: NodeId,
    tile: &PatternTile,
) -> PictureId {
    let recording = cx.begin_picture();
    let mark = cx.mark();
    cx.canvas.push_clip_rect(Affine::IDENTITY, tile.tile);
    cx.push_undo(UndoAction::PopClip);
    let children: SmallVec<[NodeId; 8]> = cx.tree.children(tile.content).collect();
    for child in children {
        paint_node(cx, child, tile.content_transform);
    }
    cx.unwind_to(mark);
    let (picture, cacheable) = cx.end_picture(recording);
    let cached = cacheable && cx.tree.set_client_picture(pattern, client, picture);
    cx.keep_picture(cached, picture);
    picture
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use peniko::color::palette::css;
    use sheaf_core::resource::{
        GradientData, GradientStop, LinearGradientData, ResourceData, ResourceKind,
    };
    use sheaf_core::style::ComputedStyle;
    use sheaf_core::trace::Tracer;
    use sheaf_core::tree::{NodeKind, RenderTree, RootData, ShapeGeometry};

    use super::*;
    use crate::recording::RecordingCanvas;

    fn with_fill(server: Option<ResourceKind>, fill: SvgPaint) -> (RenderTree, NodeId) {
        let mut tree = RenderTree::new();
        let root = tree.create_node(NodeKind::Root(RootData::default()), ComputedStyle::default());
        if let Some(kind) = server {
            let s = tree.create_node(
                NodeKind::Resource(ResourceData::new("s", kind)),
                ComputedStyle::default(),
            );
            tree.append_child(root, s);
        }
        let shape = tree.create_node(
            NodeKind::Shape(ShapeGeometry::rect(0.0, 0.0, 10.0, 10.0)),
            ComputedStyle {
                fill,
                fill_opacity: 0.5,
                ..ComputedStyle::default()
            },
        );
        tree.append_child(root, shape);
        let _ = tree.layout();
        (tree, shape)
    }

    fn resolve(tree: &mut RenderTree, node: NodeId) -> Option<Brush> {
        let mut canvas = RecordingCanvas::new();
        let mut tracer = Tracer::none();
        let mut cx = PaintContext::new(tree, &mut canvas, &mut tracer);
        resolve_brush(&mut cx, node, PaintSlot::Fill)
    }

    fn server_ref(fallback: Option<peniko::Color>) -> SvgPaint {
        SvgPaint::Url {
            id: "s".to_string(),
            fallback,
        }
    }

    #[test]
    fn color_takes_the_paint_opacity() {
        let (mut tree, shape) = with_fill(None, SvgPaint::Color(css::RED));
        let Some(Brush::Solid(c)) = resolve(&mut tree, shape) else {
            panic!("expected a solid brush");
        };
        assert!((c.components[3] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn no_paint_is_no_brush() {
        let (mut tree, shape) = with_fill(None, SvgPaint::None);
        assert!(resolve(&mut tree, shape).is_none());
    }

    #[test]
    fn gradient_resolves_to_a_shader() {
        let gradient = ResourceKind::LinearGradient(LinearGradientData {
            common: GradientData {
                stops: vec![
                    GradientStop {
                        offset: 0.0,
                        color: css::RED,
                    },
                    GradientStop {
                        offset: 1.0,
                        color: css::BLUE,
                    },
                ],
                ..GradientData::default()
            },
            ..LinearGradientData::default()
        });
        let (mut tree, shape) = with_fill(Some(gradient), server_ref(None));
        let Some(Brush::Gradient { shader, alpha }) = resolve(&mut tree, shape) else {
            panic!("expected a gradient");
        };
        assert_eq!(shader.stops.len(), 2);
        assert!((alpha - 0.5).abs() < 1e-6);
    }

    #[test]
    fn stopless_gradient_uses_the_fallback() {
        let gradient = ResourceKind::LinearGradient(LinearGradientData::default());
        let (mut tree, shape) = with_fill(Some(gradient), server_ref(Some(css::GREEN)));
        assert!(matches!(resolve(&mut tree, shape), Some(Brush::Solid(_))));
    }

    #[test]
    fn missing_server_without_fallback_paints_nothing() {
        let (mut tree, shape) = with_fill(None, server_ref(None));
        assert!(resolve(&mut tree, shape).is_none());
    }
}
