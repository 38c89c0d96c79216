// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resource container state, registration and invalidation fan-out.
//!
//! # Fan-out
//!
//! [`RenderTree::mark_all_clients_for_invalidation`] walks the reference graph
//! breadth-first from one container:
//!
//! 1. A container with no clients and no client layers is skipped.
//! 2. A container already invalidated with the same mode since the last
//!    layout is skipped; the request is coalesced.
//! 3. Otherwise its derived artifacts are dropped and each client is handled:
//!    clients that are themselves containers are queued, other clients are
//!    marked according to the mode. A client inside another container's
//!    content queues that container too.
//! 4. The container's client layers are reported for repaint.
//!
//! Each container is visited at most once per wave, so reference cycles
//! terminate.

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashSet;

use crate::dirty;
use crate::tree::{LayerKey, NodeId, NodeKind, RenderTree};

/// How clients of an invalidated container are marked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InvalidationMode {
    /// Clients need full layout.
    LayoutAndBoundaries = 1,
    /// Clients need their bounding boxes recomputed.
    Boundaries = 2,
    /// Clients need a repaint only.
    Repaint = 4,
    /// Clients are not marked; only client layers are reported.
    ParentOnly = 8,
}

impl InvalidationMode {
    /// Returns the bit used in a container's invalidation mask.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// Bookkeeping attached to every resource container.
#[derive(Clone, Debug, Default)]
pub struct ContainerState {
    pub(crate) clients: Vec<NodeId>,
    pub(crate) client_layers: Vec<LayerKey>,
    /// Modes already fanned out since the last layout.
    pub(crate) invalidation_mask: u8,
    /// Set while the container is laid out ahead of a client.
    pub(crate) in_layout: bool,
    /// The id the container is registered under, while attached.
    pub(crate) registered_id: Option<String>,
}

impl ContainerState {
    pub(crate) fn add_client(&mut self, client: NodeId) {
        if !self.clients.contains(&client) {
            self.clients.push(client);
        }
    }

    pub(crate) fn remove_client(&mut self, client: NodeId) {
        self.clients.retain(|c| *c != client);
    }
}

impl RenderTree {
    /// Returns the current clients of a resource container.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node is not a resource container.
    #[must_use]
    pub fn clients(&self, container: NodeId) -> &[NodeId] {
        &self.container_state(container).clients
    }

    /// Returns the id a container is registered under, if attached.
    #[must_use]
    pub fn registered_id(&self, container: NodeId) -> Option<&str> {
        self.container_state(container).registered_id.as_deref()
    }

    /// Attaches a composited layer that draws content depending on
    /// `container`. It is reported for repaint whenever the container fans
    /// out.
    pub fn add_client_layer(&mut self, container: NodeId, layer: LayerKey) {
        self.validate(container);
        let state = self.containers[container.idx as usize]
            .as_mut()
            .unwrap_or_else(|| panic!("{container:?} is not a resource container"));
        if !state.client_layers.contains(&layer) {
            state.client_layers.push(layer);
        }
    }

    /// Detaches a composited layer from `container`.
    pub fn remove_client_layer(&mut self, container: NodeId, layer: LayerKey) {
        self.validate(container);
        if let Some(state) = self.containers[container.idx as usize].as_mut() {
            state.client_layers.retain(|l| *l != layer);
        }
    }

    /// Invalidates every client of `container`, transitively through
    /// containers that are themselves clients.
    ///
    /// Calling this twice with the same mode before the next layout is
    /// equivalent to calling it once.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node is not a resource container.
    pub fn mark_all_clients_for_invalidation(&mut self, container: NodeId, mode: InvalidationMode) {
        let _ = self.container_state(container);
        self.mark_all_clients_for_invalidation_idx(container.idx, mode);
    }

    pub(crate) fn mark_all_clients_for_invalidation_idx(&mut self, start: u32, mode: InvalidationMode) {
        let mut queue: VecDeque<(u32, InvalidationMode)> = VecDeque::new();
        let mut visited: HashSet<u32> = HashSet::new();
        queue.push_back((start, mode));

        while let Some((c, mode)) = queue.pop_front() {
            if !visited.insert(c) {
                continue;
            }
            let Some(state) = self.containers[c as usize].as_mut() else {
                continue;
            };
            if state.clients.is_empty() && state.client_layers.is_empty() {
                continue;
            }
            if state.invalidation_mask & mode.bits() != 0 {
                #[cfg(feature = "trace")]
                self.pending_trace
                    .invalidations
                    .push(crate::trace::InvalidationEvent {
                        container_index: c,
                        mode_bits: mode.bits(),
                        clients: 0,
                        layers: 0,
                        coalesced: true,
                    });
                continue;
            }
            state.invalidation_mask |= mode.bits();
            let clients = state.clients.clone();
            let layers = state.client_layers.clone();

            self.artifacts.remove_container(c);
            for client in &clients {
                if !self.is_alive(*client) {
                    continue;
                }
                let k = client.idx;
                if self.containers[k as usize].is_some() {
                    self.artifacts.remove_container(k);
                    queue.push_back((k, mode));
                } else if mode != InvalidationMode::ParentOnly {
                    self.remove_client_from_cache(k, mode);
                }
                if let Some(enclosing) = self.enclosing_resource(k) {
                    queue.push_back((enclosing, mode));
                }
            }
            log::debug!(
                "invalidated {} client(s) of resource {c} ({mode:?})",
                clients.len()
            );
            self.pending_layers.extend_from_slice(&layers);

            #[cfg(feature = "trace")]
            self.pending_trace
                .invalidations
                .push(crate::trace::InvalidationEvent {
                    container_index: c,
                    mode_bits: mode.bits(),
                    clients: u32::try_from(clients.len()).unwrap_or(u32::MAX),
                    layers: u32::try_from(layers.len()).unwrap_or(u32::MAX),
                    coalesced: false,
                });
        }
    }

    /// Resets every container's invalidation mask.
    pub(crate) fn clear_invalidation_masks(&mut self) {
        for state in self.containers.iter_mut().flatten() {
            state.invalidation_mask = 0;
        }
    }

    // -- Registration --

    /// Registers an attached container under its id and resolves clients
    /// waiting on that id.
    pub(crate) fn register_container(&mut self, idx: u32) {
        let NodeKind::Resource(data) = &self.kind[idx as usize] else {
            return;
        };
        if data.id.is_empty() {
            return;
        }
        let id = data.id.clone();
        let node = self.id_at(idx);
        if let Some(state) = self.containers[idx as usize].as_mut() {
            state.registered_id = Some(id.clone());
        }
        if !self.registry.add_resource(&id, node) {
            log::debug!("resource {idx} shadowed by an earlier container with id {id:?}");
            return;
        }

        let pending = self.registry.remove_pending_resource(&id);
        let mut resolved = 0_u32;
        for client in pending {
            if !self.is_alive(client) || !self.is_attached_idx(client.idx) {
                continue;
            }
            self.rebuild_client_resources(client.idx);
            self.mark_needs_layout(client.idx);
            resolved += 1;
        }
        if resolved > 0 {
            log::debug!("resource {id:?} resolved {resolved} pending client(s)");
            #[cfg(feature = "trace")]
            self.pending_trace
                .resolved
                .push(crate::trace::PendingResolvedEvent {
                    container_index: idx,
                    clients: resolved,
                });
        }
    }

    /// Invalidates a container's clients, deregisters it and re-resolves the
    /// clients, which either bind to the next container with the same id or
    /// become pending.
    pub(crate) fn deregister_container(&mut self, idx: u32) {
        let Some(id) = self.containers[idx as usize]
            .as_mut()
            .and_then(|s| s.registered_id.take())
        else {
            return;
        };
        let node = self.id_at(idx);
        self.mark_all_clients_for_invalidation_idx(idx, InvalidationMode::LayoutAndBoundaries);
        self.registry.remove_resource(&id, node);

        let clients = self.containers[idx as usize]
            .as_mut()
            .map(|s| core::mem::take(&mut s.clients))
            .unwrap_or_default();
        for client in clients {
            if self.is_alive(client) && self.is_attached_idx(client.idx) {
                self.rebuild_client_resources(client.idx);
                self.mark_needs_layout(client.idx);
            }
        }
        self.artifacts.remove_container(idx);
    }

    fn container_state(&self, container: NodeId) -> &ContainerState {
        self.validate(container);
        self.containers[container.idx as usize]
            .as_ref()
            .unwrap_or_else(|| panic!("{container:?} is not a resource container"))
    }

    /// Marks one non-container client according to `mode`.
    pub(crate) fn mark_client(&mut self, idx: u32, mode: InvalidationMode) {
        match mode {
            InvalidationMode::LayoutAndBoundaries => self.mark_needs_layout(idx),
            InvalidationMode::Boundaries => self.mark_needs_boundaries_update(idx),
            InvalidationMode::Repaint => self.dirty.mark(idx, dirty::PAINT),
            InvalidationMode::ParentOnly => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ClipPathData, ResourceData, ResourceKind};
    use crate::style::{ClipPathRef, ComputedStyle};
    use crate::tree::{RootData, ShapeGeometry};

    fn clip(id: &str) -> NodeKind {
        NodeKind::Resource(ResourceData::new(
            id,
            ResourceKind::ClipPath(ClipPathData::default()),
        ))
    }

    fn clipped(id: &str) -> ComputedStyle {
        ComputedStyle {
            clip_path: Some(ClipPathRef::Url(id.into())),
            ..ComputedStyle::default()
        }
    }

    fn rect() -> NodeKind {
        NodeKind::Shape(ShapeGeometry::rect(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn fan_out_is_idempotent() {
        let mut tree = RenderTree::new();
        let root = tree.create_node(NodeKind::Root(RootData::default()), ComputedStyle::default());
        let c = tree.create_node(clip("c"), ComputedStyle::default());
        let a = tree.create_node(rect(), clipped("c"));
        tree.append_child(root, c);
        tree.append_child(root, a);
        tree.add_client_layer(c, LayerKey(9));
        let _ = tree.layout();

        tree.mark_all_clients_for_invalidation(c, InvalidationMode::LayoutAndBoundaries);
        assert!(tree.layout_flags(a).self_needs_layout);
        assert_eq!(tree.pending_layers, &[LayerKey(9)]);

        tree.mark_all_clients_for_invalidation(c, InvalidationMode::LayoutAndBoundaries);
        assert_eq!(tree.pending_layers, &[LayerKey(9)], "second call is coalesced");

        let changes = tree.layout();
        assert_eq!(changes.layers, &[LayerKey(9)]);
        assert_eq!(tree.containers[c.idx as usize].as_ref().map(|s| s.invalidation_mask), Some(0));
    }

    #[test]
    fn mutually_referencing_containers_terminate() {
        let mut tree = RenderTree::new();
        let root = tree.create_node(NodeKind::Root(RootData::default()), ComputedStyle::default());
        let a = tree.create_node(clip("a"), clipped("b"));
        let b = tree.create_node(clip("b"), clipped("a"));
        let s = tree.create_node(rect(), clipped("a"));
        tree.append_child(root, a);
        tree.append_child(root, b);
        tree.append_child(root, s);
        assert_eq!(tree.clients(a), &[b, s]);
        assert_eq!(tree.clients(b), &[a]);
        let _ = tree.layout();

        tree.mark_all_clients_for_invalidation(b, InvalidationMode::Repaint);
        // Reaching `s` means the wave passed through `a` and stopped.
        assert!(tree.containers[a.idx as usize].as_ref().is_some_and(|st| st.invalidation_mask != 0));
        let changes = tree.layout();
        assert!(changes.repaint.contains(&s.idx), "{:?}", changes.repaint);
    }

    #[test]
    fn parent_only_reports_layers_without_marking() {
        let mut tree = RenderTree::new();
        let root = tree.create_node(NodeKind::Root(RootData::default()), ComputedStyle::default());
        let c = tree.create_node(clip("c"), ComputedStyle::default());
        let a = tree.create_node(rect(), clipped("c"));
        tree.append_child(root, c);
        tree.append_child(root, a);
        tree.add_client_layer(c, LayerKey(1));
        let _ = tree.layout();

        tree.mark_all_clients_for_invalidation(c, InvalidationMode::ParentOnly);
        assert!(!tree.layout_flags(a).needs_layout);
        let changes = tree.layout();
        assert!(!changes.repaint.contains(&a.idx));
        assert_eq!(changes.layers, &[LayerKey(1)]);
    }

    #[test]
    fn id_change_moves_clients_to_pending() {
        let mut tree = RenderTree::new();
        let root = tree.create_node(NodeKind::Root(RootData::default()), ComputedStyle::default());
        let c = tree.create_node(clip("old"), ComputedStyle::default());
        let a = tree.create_node(rect(), clipped("old"));
        tree.append_child(root, c);
        tree.append_child(root, a);
        assert_eq!(tree.resources(a).and_then(|r| r.clipper), Some(c));

        tree.set_kind(c, clip("new"));
        assert_eq!(tree.registered_id(c), Some("new"));
        assert!(tree.resources(a).is_none());
        assert!(tree.registry().has_pending_resource("old"));
        assert!(tree.clients(c).is_empty());

        let b = tree.create_node(rect(), clipped("new"));
        tree.append_child(root, b);
        assert_eq!(tree.clients(c), &[b]);
    }
}
