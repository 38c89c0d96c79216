// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Building resource records and keeping them in step with the tree.
//!
//! The render tree calls the `client_*` hooks on style changes, tree
//! membership changes and destruction. Each hook leaves the client's
//! [`SvgResources`] record, the referenced containers' client lists and the
//! registry's pending lists mutually consistent.

use alloc::string::String;

use smallvec::SmallVec;

use crate::style::{ClipPathRef, StyleDifference};
use crate::tree::{NodeId, NodeKind, RenderTree};

use super::container::InvalidationMode;
use super::kinds::ResourceType;
use super::resources::SvgResources;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Clipper,
    Masker,
    Filter,
    Fill,
    Stroke,
    MarkerStart,
    MarkerMid,
    MarkerEnd,
    Linked,
}

impl Slot {
    fn accepts(self, ty: ResourceType, own: Option<ResourceType>) -> bool {
        match self {
            Self::Clipper => ty == ResourceType::ClipPath,
            Self::Masker => ty == ResourceType::Mask,
            Self::Filter => ty == ResourceType::Filter,
            Self::Fill | Self::Stroke => ty.is_paint_server(),
            Self::MarkerStart | Self::MarkerMid | Self::MarkerEnd => ty == ResourceType::Marker,
            Self::Linked => own.is_some_and(|own| own.can_inherit_from(ty)),
        }
    }

    fn set(self, r: &mut SvgResources, c: NodeId) {
        let slot = match self {
            Self::Clipper => &mut r.clipper,
            Self::Masker => &mut r.masker,
            Self::Filter => &mut r.filter,
            Self::Fill => &mut r.fill,
            Self::Stroke => &mut r.stroke,
            Self::MarkerStart => &mut r.marker_start,
            Self::MarkerMid => &mut r.marker_mid,
            Self::MarkerEnd => &mut r.marker_end,
            Self::Linked => &mut r.linked,
        };
        *slot = Some(c);
    }
}

impl RenderTree {
    /// Collects the id references of the node at `idx` that apply to its kind.
    fn references(&self, idx: u32) -> SmallVec<[(Slot, String); 4]> {
        let style = &self.style[idx as usize];
        let kind = &self.kind[idx as usize];
        let mut refs = SmallVec::new();

        if let NodeKind::Resource(data) = kind {
            // Containers take part in rendering only through their clients;
            // of the effect properties only clip-path applies to a clipPath.
            if data.kind.ty() == ResourceType::ClipPath {
                if let Some(ClipPathRef::Url(id)) = &style.clip_path {
                    refs.push((Slot::Clipper, id.clone()));
                }
            }
            if let Some(href) = data.kind.href() {
                refs.push((Slot::Linked, String::from(href)));
            }
            return refs;
        }

        if let Some(ClipPathRef::Url(id)) = &style.clip_path {
            refs.push((Slot::Clipper, id.clone()));
        }
        if let Some(id) = &style.mask {
            refs.push((Slot::Masker, id.clone()));
        }
        if let Some(id) = &style.filter {
            refs.push((Slot::Filter, id.clone()));
        }
        if matches!(kind, NodeKind::Shape(_) | NodeKind::Text(_) | NodeKind::TextSpan(_)) {
            if let Some(id) = style.fill.url() {
                refs.push((Slot::Fill, String::from(id)));
            }
            if let Some(id) = style.stroke.url() {
                refs.push((Slot::Stroke, String::from(id)));
            }
        }
        if let NodeKind::Shape(shape) = kind {
            if shape.supports_markers() {
                for (slot, id) in [
                    (Slot::MarkerStart, &style.marker_start),
                    (Slot::MarkerMid, &style.marker_mid),
                    (Slot::MarkerEnd, &style.marker_end),
                ] {
                    if let Some(id) = id {
                        refs.push((slot, id.clone()));
                    }
                }
            }
        }
        refs
    }

    /// Resolves every reference of the node at `idx`, recording unresolved
    /// ids as pending.
    pub(crate) fn build_resources(&mut self, idx: u32) -> SvgResources {
        let client = self.id_at(idx);
        let own = self.kind[idx as usize].resource_type();
        let mut resources = SvgResources::default();
        for (slot, id) in self.references(idx) {
            match self.registry.resource(&id) {
                Some(c) => {
                    let ty = self.kind[c.idx as usize].resource_type();
                    if ty.is_some_and(|ty| slot.accepts(ty, own)) {
                        slot.set(&mut resources, c);
                    } else {
                        log::debug!("node {idx}: #{id} is not usable as {slot:?}");
                    }
                }
                None => {
                    log::debug!("node {idx}: #{id} is pending");
                    self.registry.add_pending_resource(&id, client);
                }
            }
        }
        resources
    }

    /// Builds and stores the record for `idx`, joining each referenced
    /// container's client list.
    fn add_resources_for(&mut self, idx: u32) {
        let client = self.id_at(idx);
        let resources = self.build_resources(idx);
        for c in resources.containers() {
            if let Some(state) = self.containers[c.idx as usize].as_mut() {
                state.add_client(client);
            }
        }
        if !resources.is_empty() {
            self.cache.insert(idx, resources);
        }
    }

    /// Drops the record for `idx`, leaving every client list and pending list
    /// it was on.
    fn remove_resources_for(&mut self, idx: u32) {
        let client = self.id_at(idx);
        self.registry.remove_pending_client(client);
        if let Some(old) = self.cache.remove(idx) {
            for c in old.containers() {
                if !self.is_alive(c) {
                    continue;
                }
                if let Some(state) = self.containers[c.idx as usize].as_mut() {
                    state.remove_client(client);
                }
                self.artifacts.remove_pair(c.idx, idx);
            }
        }
    }

    pub(crate) fn rebuild_client_resources(&mut self, idx: u32) {
        self.remove_resources_for(idx);
        self.add_resources_for(idx);
    }

    // -- Lifecycle hooks --

    /// The node joined a document.
    pub(crate) fn client_was_added_to_tree(&mut self, idx: u32) {
        if self.containers[idx as usize].is_some() {
            self.register_container(idx);
        }
        self.add_resources_for(idx);
    }

    /// The node is about to leave its document.
    pub(crate) fn client_will_be_removed_from_tree(&mut self, idx: u32) {
        self.remove_resources_for(idx);
        if self.containers[idx as usize].is_some() {
            self.deregister_container(idx);
        }
    }

    /// The node's style changed.
    pub(crate) fn client_style_changed(&mut self, idx: u32, diff: StyleDifference) {
        if diff == StyleDifference::Layout {
            self.rebuild_client_resources(idx);
        }
    }

    /// The node's bounding box changed; its per-client artifacts are stale.
    pub(crate) fn client_layout_changed(&mut self, idx: u32) {
        self.artifacts.remove_client(idx);
    }

    /// The node is being destroyed.
    pub(crate) fn client_destroyed(&mut self, idx: u32) {
        self.remove_resources_for(idx);
        self.artifacts.remove_client(idx);
    }

    /// Called by an invalidated container for each non-container client: drops
    /// the client's cached artifacts and marks it according to `mode`.
    pub(crate) fn remove_client_from_cache(&mut self, idx: u32, mode: InvalidationMode) {
        self.artifacts.remove_client(idx);
        self.mark_client(idx, mode);
    }
}
