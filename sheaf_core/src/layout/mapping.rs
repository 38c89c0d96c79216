// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordinate mapping between node user spaces and host space.
//!
//! A node's `local_to_parent` transform maps its user space into its
//! parent's. For a [`NodeKind::Root`] the parent space is the host's
//! border-box pixel space, and the root's transform carries the host
//! location, content offset and zoom. Walking `local_to_parent` up to and
//! including the root therefore crosses the host boundary exactly once.

use kurbo::{Affine, Rect};

use crate::transform::{MapDirection, TransformState};
use crate::tree::{INVALID, NodeId, NodeKind, RenderTree};

impl RenderTree {
    /// Returns the transform from the node's user space to its parent's,
    /// including any viewport transform the node establishes.
    ///
    /// Valid after layout.
    #[must_use]
    pub fn local_to_parent_transform(&self, id: NodeId) -> Affine {
        self.validate(id);
        self.local_to_parent[id.idx as usize]
    }

    /// Accumulates the transforms from `id` up to `ancestor` (exclusive)
    /// into `state`. With `ancestor` = `None` the walk goes up to host space.
    ///
    /// # Panics
    ///
    /// Panics if `state` maps in the other direction, or if `ancestor` is
    /// not an ancestor of `id`.
    pub fn map_local_to_ancestor(
        &self,
        id: NodeId,
        ancestor: Option<NodeId>,
        state: &mut TransformState,
    ) {
        assert_eq!(
            state.direction(),
            MapDirection::LocalToAncestor,
            "transform state maps the wrong way"
        );
        self.accumulate(id, ancestor, state);
    }

    /// Accumulates the transforms between `ancestor` and `id` into `state`,
    /// which then maps from the ancestor's space down into `id`'s.
    ///
    /// # Panics
    ///
    /// As for [`map_local_to_ancestor`](Self::map_local_to_ancestor).
    pub fn map_ancestor_to_local(
        &self,
        ancestor: Option<NodeId>,
        id: NodeId,
        state: &mut TransformState,
    ) {
        assert_eq!(
            state.direction(),
            MapDirection::AncestorToLocal,
            "transform state maps the wrong way"
        );
        self.accumulate(id, ancestor, state);
    }

    fn accumulate(&self, id: NodeId, ancestor: Option<NodeId>, state: &mut TransformState) {
        self.validate(id);
        let stop = ancestor.map_or(INVALID, |a| {
            self.validate(a);
            a.idx
        });
        let mut n = id.idx;
        while n != stop {
            assert!(n != INVALID, "{ancestor:?} is not an ancestor of {id:?}");
            state.apply(self.local_to_parent[n as usize]);
            n = self.parent[n as usize];
        }
    }

    /// Returns the transform from the node's user space to host space.
    #[must_use]
    pub fn local_to_host_transform(&self, id: NodeId) -> Affine {
        self.validate(id);
        self.local_to_host_idx(id.idx)
    }

    pub(crate) fn local_to_host_idx(&self, idx: u32) -> Affine {
        let mut t = Affine::IDENTITY;
        let mut n = idx;
        while n != INVALID {
            t = self.local_to_parent[n as usize] * t;
            n = self.parent[n as usize];
        }
        t
    }

    /// Returns the node's visual rect in host space, or an empty rectangle
    /// if it paints nothing or is not in a document.
    #[must_use]
    pub fn absolute_visual_rect(&self, id: NodeId) -> Rect {
        self.validate(id);
        self.absolute_visual_rect_idx(id.idx).unwrap_or(Rect::ZERO)
    }

    pub(crate) fn absolute_visual_rect_idx(&self, idx: u32) -> Option<Rect> {
        let visual = self.visual_rect[idx as usize]?;
        let mut top = idx;
        while self.parent[top as usize] != INVALID {
            top = self.parent[top as usize];
        }
        if !matches!(self.kind[top as usize], NodeKind::Root(_)) {
            return None;
        }
        let t = self.local_to_host_idx(idx);
        t.is_finite().then(|| t.transform_rect_bbox(visual))
    }
}
