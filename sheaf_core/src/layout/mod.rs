// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layout pass and change tracking.
//!
//! Layout follows a drain-recompute pattern:
//!
//! 1. **LAYOUT**: Drain dirty indices (the mutated nodes and, through the
//!    dependency edges, their ancestors), flag them, and lay out every root
//!    top-down. Containers lay out their children before aggregating their
//!    bounding boxes. Resource invalidation raised while laying out is picked
//!    up by another pass, up to [`TreeConfig::max_layout_passes`].
//! 2. **Invalidate**: Report the fan-outs buffered since the last pass.
//! 3. **PAINT**: Drain repaint-only requests.
//! 4. **TOPOLOGY**: Drain and report whether the structure changed.
//!
//! Finally every container's invalidation mask is cleared, so the next
//! mutation can fan out again.
//!
//! [`LayoutChanges`] uses raw slot indices (`u32`) rather than [`NodeId`]
//! handles, like the rest of the per-pass reporting.
//!
//! [`TreeConfig::max_layout_passes`]: crate::tree::TreeConfig::max_layout_passes
//! [`NodeId`]: crate::tree::NodeId

mod damage;
mod mapping;
mod support;

use alloc::vec::Vec;

use kurbo::Affine;

pub use damage::DamageRegion;

use crate::dirty;
use crate::trace::{LayoutSummary, PhaseBeginEvent, PhaseEndEvent, PhaseKind, Tracer};
use crate::tree::{INVALID, LayerKey, NodeKind, RenderTree};

use support::Force;

/// The set of changes produced by a single [`RenderTree::layout`] call.
#[derive(Clone, Debug, Default)]
pub struct LayoutChanges {
    /// Nodes laid out, in layout order.
    pub laid_out: Vec<u32>,
    /// Nodes whose object, stroke or visual box changed.
    pub boundaries_changed: Vec<u32>,
    /// Nodes that requested a repaint without layout.
    pub repaint: Vec<u32>,
    /// Composited client layers of invalidated resource containers.
    pub layers: Vec<LayerKey>,
    /// Host-space area to repaint.
    pub damage: DamageRegion,
    /// Nodes created since the last layout.
    pub added: Vec<u32>,
    /// Nodes destroyed since the last layout.
    pub removed: Vec<u32>,
    /// Whether nodes were created, destroyed, attached or detached.
    pub topology_changed: bool,
    /// Layout passes run.
    pub passes: u32,
}

impl LayoutChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.laid_out.clear();
        self.boundaries_changed.clear();
        self.repaint.clear();
        self.layers.clear();
        self.damage = DamageRegion::None;
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
        self.passes = 0;
    }
}

/// State threaded through one layout pass.
pub(crate) struct LayoutCx<'a, 't> {
    pub(crate) changes: &'a mut LayoutChanges,
    pub(crate) tracer: &'a mut Tracer<'t>,
    pub(crate) pass_index: u64,
}

impl RenderTree {
    /// Lays out every dirty node and returns what changed.
    pub fn layout(&mut self) -> LayoutChanges {
        let mut changes = LayoutChanges::default();
        self.layout_into(&mut changes, &mut Tracer::none());
        changes
    }

    /// Like [`layout`](Self::layout), reporting to `tracer`.
    pub fn layout_with_tracer(&mut self, tracer: &mut Tracer<'_>) -> LayoutChanges {
        let mut changes = LayoutChanges::default();
        self.layout_into(&mut changes, tracer);
        changes
    }

    /// Like [`layout_with_tracer`](Self::layout_with_tracer), but reuses a
    /// caller-provided buffer to avoid allocation.
    pub fn layout_into(&mut self, changes: &mut LayoutChanges, tracer: &mut Tracer<'_>) {
        changes.clear();
        self.pass_index += 1;
        let pass_index = self.pass_index;

        tracer.phase_begin(&PhaseBeginEvent {
            pass_index,
            phase: PhaseKind::Layout,
        });
        let max_passes = self.config.max_layout_passes.max(1);
        loop {
            // Drain LAYOUT: the dirty nodes plus their ancestors.
            let dirty_layout: Vec<u32> = self
                .dirty
                .drain(dirty::LAYOUT)
                .affected()
                .deterministic()
                .run()
                .collect();
            if dirty_layout.is_empty() {
                break;
            }
            if changes.passes == max_passes {
                log::warn!("layout did not settle after {max_passes} passes");
                // Leave the rest for the next call.
                for idx in dirty_layout {
                    self.dirty.mark(idx, dirty::LAYOUT);
                }
                break;
            }
            changes.passes += 1;
            for &idx in &dirty_layout {
                if idx < self.len {
                    self.flags[idx as usize].needs_layout = true;
                }
            }
            let mut cx = LayoutCx {
                changes: &mut *changes,
                tracer: &mut *tracer,
                pass_index,
            };
            for idx in 0..self.len {
                if self.parent[idx as usize] == INVALID
                    && matches!(self.kind[idx as usize], NodeKind::Root(_))
                    && !self.free_list.contains(&idx)
                {
                    self.layout_node(idx, Affine::IDENTITY, Force::default(), &mut cx);
                }
            }
        }
        tracer.phase_end(&PhaseEndEvent {
            pass_index,
            phase: PhaseKind::Layout,
        });

        tracer.phase_begin(&PhaseBeginEvent {
            pass_index,
            phase: PhaseKind::Invalidate,
        });
        #[cfg(feature = "trace")]
        self.pending_trace.flush(tracer);
        tracer.phase_end(&PhaseEndEvent {
            pass_index,
            phase: PhaseKind::Invalidate,
        });

        // Drain PAINT: no recomputation, just collect.
        changes.repaint = self
            .dirty
            .drain(dirty::PAINT)
            .deterministic()
            .run()
            .collect();
        for &idx in &changes.repaint {
            if let Some(r) = self.absolute_visual_rect_idx(idx) {
                changes.damage.add(r);
            }
        }

        // Drain TOPOLOGY.
        let topology: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();
        changes.topology_changed = !topology.is_empty();

        // Move lifecycle lists.
        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
        core::mem::swap(&mut self.pending_layers, &mut changes.layers);
        changes.layers.sort_unstable();
        changes.layers.dedup();
        for r in self.pending_damage.drain(..) {
            changes.damage.add(r);
        }

        self.clear_invalidation_masks();

        #[cfg(feature = "trace-rich")]
        if let DamageRegion::Rects(rects) = &changes.damage {
            let rects: Vec<crate::trace::DamageRect> =
                rects.iter().map(|r| damage_rect(*r)).collect();
            tracer.damage_rects(pass_index, &rects);
        }

        tracer.layout_summary(&LayoutSummary {
            pass_index,
            laid_out: count(changes.laid_out.len()),
            boundaries_changed: count(changes.boundaries_changed.len()),
            repaints: count(changes.repaint.len()),
            layers: count(changes.layers.len()),
        });
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(feature = "trace-rich")]
#[expect(
    clippy::cast_possible_truncation,
    reason = "damage is clamped to the i32/u32 pixel range by the saturating casts"
)]
fn damage_rect(r: kurbo::Rect) -> crate::trace::DamageRect {
    let r = r.expand();
    crate::trace::DamageRect {
        x: r.x0 as i32,
        y: r.y0 as i32,
        width: r.width() as u32,
        height: r.height() as u32,
    }
}
