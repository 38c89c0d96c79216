// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-client record of resolved resource references.

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::tree::NodeId;

/// The resource containers one client references, at most one per slot.
///
/// Entries are handles into the tree, never owners. The record is rebuilt
/// wholesale whenever the client's references may have changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SvgResources {
    /// `clip-path: url(#…)`.
    pub clipper: Option<NodeId>,
    /// `mask`.
    pub masker: Option<NodeId>,
    /// `filter`.
    pub filter: Option<NodeId>,
    /// Paint server used by `fill`.
    pub fill: Option<NodeId>,
    /// Paint server used by `stroke`.
    pub stroke: Option<NodeId>,
    /// `marker-start`.
    pub marker_start: Option<NodeId>,
    /// `marker-mid`.
    pub marker_mid: Option<NodeId>,
    /// `marker-end`.
    pub marker_end: Option<NodeId>,
    /// `href` target of a pattern or gradient.
    pub linked: Option<NodeId>,
}

impl SvgResources {
    /// Returns whether no slot is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns the distinct referenced containers.
    #[must_use]
    pub fn containers(&self) -> SmallVec<[NodeId; 4]> {
        let mut out = SmallVec::new();
        for c in [
            self.clipper,
            self.masker,
            self.filter,
            self.fill,
            self.stroke,
            self.marker_start,
            self.marker_mid,
            self.marker_end,
            self.linked,
        ]
        .into_iter()
        .flatten()
        {
            if !out.contains(&c) {
                out.push(c);
            }
        }
        out
    }
}

/// Resolved resource records keyed by client slot.
///
/// Only clients with at least one resolved reference have an entry.
#[derive(Clone, Debug, Default)]
pub struct ResourceCache {
    entries: HashMap<u32, SvgResources>,
}

impl ResourceCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for the client at slot `idx`.
    #[must_use]
    pub fn get(&self, idx: u32) -> Option<&SvgResources> {
        self.entries.get(&idx)
    }

    pub(crate) fn insert(&mut self, idx: u32, resources: SvgResources) {
        self.entries.insert(idx, resources);
    }

    pub(crate) fn remove(&mut self, idx: u32) -> Option<SvgResources> {
        self.entries.remove(&idx)
    }

    /// Returns the number of clients with a record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no client has a record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
