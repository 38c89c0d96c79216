// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! State shared by the painters during one paint traversal.

use sheaf_core::error::EffectError;
use sheaf_core::trace::{EffectEvent, EffectKind, EffectOutcome, Tracer};
use sheaf_core::tree::{NodeId, PictureId, RenderTree};
use smallvec::SmallVec;

use crate::canvas::Canvas;
use crate::scope::{ScopeMark, ScopeStack, UndoAction};

/// Counts gathered during one paint traversal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaintStats {
    /// Nodes whose content was drawn.
    pub painted: u32,
    /// Nodes skipped because an effect could not be established.
    pub skipped: u32,
    /// Pictures recorded for clip, mask and pattern content.
    pub pictures_recorded: u32,
}

/// An open recording started by [`PaintContext::begin_picture`].
#[derive(Debug)]
#[must_use]
pub(crate) struct Recording {
    outer_cut: Option<usize>,
    owner_depth: usize,
}

/// The tree, canvas and bookkeeping a paint traversal threads through.
pub(crate) struct PaintContext<'a, 't> {
    pub(crate) tree: &'a mut RenderTree,
    pub(crate) canvas: &'a mut dyn Canvas,
    pub(crate) tracer: &'a mut Tracer<'t>,
    pub(crate) scopes: ScopeStack,
    /// Resource containers being applied, outermost first. Re-entering one
    /// is a reference cycle.
    pub(crate) active: SmallVec<[NodeId; 4]>,
    /// Shallowest position in `active` at which a cycle was cut since the
    /// current recording began.
    cut_depth: Option<usize>,
    /// Pictures recorded this traversal that no cache took ownership of.
    transient: SmallVec<[PictureId; 2]>,
    pub(crate) stats: PaintStats,
}

impl core::fmt::Debug for PaintContext<'_, '_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PaintContext")
            .field("scopes", &self.scopes)
            .field("active", &self.active)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<'a, 't> PaintContext<'a, 't> {
    pub(crate) fn new(
        tree: &'a mut RenderTree,
        canvas: &'a mut dyn Canvas,
        tracer: &'a mut Tracer<'t>,
    ) -> Self {
        Self {
            tree,
            canvas,
            tracer,
            scopes: ScopeStack::new(),
            active: SmallVec::new(),
            cut_depth: None,
            transient: SmallVec::new(),
            stats: PaintStats::default(),
        }
    }

    // -- Scopes --

    pub(crate) fn mark(&self) -> ScopeMark {
        self.scopes.mark()
    }

    pub(crate) fn push_undo(&mut self, action: UndoAction) {
        self.scopes.push(action);
    }

    pub(crate) fn unwind_to(&mut self, mark: ScopeMark) {
        self.scopes.unwind_to(mark, &mut *self.canvas);
    }

    // -- Acquisition --

    /// Marks `container` as being applied.
    ///
    /// # Errors
    ///
    /// [`EffectError::ReferenceCycle`] if it already is.
    pub(crate) fn acquire(&mut self, container: NodeId) -> Result<(), EffectError> {
        if let Some(depth) = self.active.iter().position(|&c| c == container) {
            self.cut_depth = Some(self.cut_depth.map_or(depth, |d| d.min(depth)));
            log::warn!("resource {container:?} references itself; effect skipped");
            return Err(EffectError::ReferenceCycle(container));
        }
        self.active.push(container);
        Ok(())
    }

    /// Releases the innermost acquisition, which must be `container`.
    pub(crate) fn release(&mut self, container: NodeId) {
        let top = self.active.pop();
        debug_assert_eq!(top, Some(container), "acquisitions released out of order");
    }

    // -- Pictures --

    /// Starts recording content for the innermost acquired resource.
    pub(crate) fn begin_picture(&mut self) -> Recording {
        self.canvas.begin_picture();
        Recording {
            outer_cut: self.cut_depth.take(),
            owner_depth: self.active.len().saturating_sub(1),
        }
    }

    /// Ends a recording and counts it. Returns the picture and whether it
    /// may be cached.
    ///
    /// A picture is only cacheable when every cycle cut while recording it
    /// was at the recorded resource or below it. A cut further out depends
    /// on where the resource was reached from, so the same resource reached
    /// from elsewhere would record different content.
    pub(crate) fn end_picture(&mut self, recording: Recording) -> (PictureId, bool) {
        self.stats.pictures_recorded += 1;
        let picture = self.canvas.end_picture();
        let inner_cut = self.cut_depth;
        let cacheable = inner_cut.is_none_or(|d| d >= recording.owner_depth);
        self.cut_depth = match (recording.outer_cut, inner_cut) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        (picture, cacheable)
    }

    /// Keeps `picture` until the end of the traversal if the tree declined
    /// to cache it.
    pub(crate) fn keep_picture(&mut self, cached: bool, picture: PictureId) {
        if !cached {
            log::debug!("{picture:?} was not cached; released after this paint");
            self.transient.push(picture);
        }
    }

    /// Hands the pictures nothing refers to any more back to the canvas.
    pub(crate) fn release_stale_pictures(&mut self) {
        for picture in self.tree.take_released_pictures() {
            self.canvas.release_picture(picture);
        }
        for picture in self.transient.drain(..) {
            self.canvas.release_picture(picture);
        }
    }

    // -- Tracing --

    pub(crate) fn effect(&mut self, node: NodeId, effect: EffectKind, outcome: EffectOutcome) {
        self.tracer.effect(&EffectEvent {
            node_index: node.index(),
            effect,
            outcome,
        });
    }
}
