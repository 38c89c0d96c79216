// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Painting markers at a shape's vertices.

use kurbo::Affine;
use sheaf_core::resource::MarkerInstance;
use sheaf_core::trace::{EffectKind, EffectOutcome};
use sheaf_core::tree::NodeId;
use smallvec::SmallVec;

use crate::context::PaintContext;
use crate::painter::paint_node;
use crate::scope::UndoAction;

/// Paints each marker instance of `node` over its stroke.
///
/// A marker that is already being painted further up (a marker whose
/// content carries the same marker) is skipped; the others still paint.
pub(crate) fn paint_markers(
    cx: &mut PaintContext<'_, '_>,
    node: NodeId,
    markers: &[MarkerInstance],
    ctm: Affine,
) {
    for marker in markers {
        if let Err(e) = cx.acquire(marker.container) {
            cx.effect(node, EffectKind::Marker, EffectOutcome::Failed(e));
            continue;
        }
        let at = ctm * marker.transform;
        let mark = cx.mark();
        if let Some(clip) = marker.clip {
            cx.canvas.push_clip_rect(at, clip);
            cx.push_undo(UndoAction::PopClip);
        }
        let children: SmallVec<[NodeId; 8]> = cx.tree.children(marker.container).collect();
        for child in children {
            paint_node(cx, child, at);
        }
        cx.unwind_to(mark);
        cx.release(marker.container);
        cx.effect(node, EffectKind::Marker, EffectOutcome::Applied);
    }
}
