// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Establishing `filter`.

use kurbo::Affine;
use sheaf_core::error::EffectError;
use sheaf_core::tree::NodeId;

use crate::canvas::LayerStyle;
use crate::context::PaintContext;
use crate::scope::UndoAction;

/// Opens a filter layer over the filter region of `node`. Returns whether a
/// filter was applied.
///
/// The primitives only transform what the node paints, so unlike clips and
/// masks a filter never paints resource content and cannot form a cycle.
pub(crate) fn apply_filter(
    cx: &mut PaintContext<'_, '_>,
    node: NodeId,
    ctm: Affine,
) -> Result<bool, EffectError> {
    if cx.tree.style(node).filter.is_none() {
        return Ok(false);
    }
    let Some(container) = cx.tree.resources(node).and_then(|r| r.filter) else {
        log::debug!("{node:?}: filter unresolved; painting unfiltered");
        return Ok(false);
    };
    let region = cx.tree.filter_region(container, node)?;
    let primitives = cx.tree.filter_primitives(container, node)?;
    cx.canvas
        .push_layer(&LayerStyle::Filter(primitives), ctm, region);
    cx.push_undo(UndoAction::PopLayer);
    Ok(true)
}
