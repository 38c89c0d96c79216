// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The document-wide `id` → container table with pending-client tracking.

use alloc::string::String;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::tree::NodeId;

/// Maps element ids to resource containers, and ids that do not resolve yet
/// to the clients waiting on them.
///
/// Several containers may share an id. All of them stay registered and the
/// first one registered is the active one; removing it promotes the next.
#[derive(Clone, Debug, Default)]
pub struct ResourceRegistry {
    resources: HashMap<String, SmallVec<[NodeId; 1]>>,
    pending: HashMap<String, SmallVec<[NodeId; 2]>>,
}

impl ResourceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `container` under `id`.
    ///
    /// Returns `true` if `container` is now the active container for `id`.
    pub fn add_resource(&mut self, id: &str, container: NodeId) -> bool {
        let entry = self.resources.entry_ref(id).or_default();
        if !entry.contains(&container) {
            entry.push(container);
        }
        entry.first() == Some(&container)
    }

    /// Deregisters `container` from `id`.
    ///
    /// Returns `true` if it was the active container.
    pub fn remove_resource(&mut self, id: &str, container: NodeId) -> bool {
        let Some(entry) = self.resources.get_mut(id) else {
            return false;
        };
        let Some(pos) = entry.iter().position(|&c| c == container) else {
            return false;
        };
        entry.remove(pos);
        if entry.is_empty() {
            self.resources.remove(id);
        }
        pos == 0
    }

    /// Returns the active container registered under `id`.
    #[must_use]
    pub fn resource(&self, id: &str) -> Option<NodeId> {
        self.resources.get(id).and_then(|e| e.first().copied())
    }

    /// Returns whether any client is waiting on `id`.
    #[must_use]
    pub fn has_pending_resource(&self, id: &str) -> bool {
        self.pending.get(id).is_some_and(|e| !e.is_empty())
    }

    /// Records that `client` references `id`, which does not resolve yet.
    pub fn add_pending_resource(&mut self, id: &str, client: NodeId) {
        let entry = self.pending.entry_ref(id).or_default();
        if !entry.contains(&client) {
            entry.push(client);
        }
    }

    /// Takes every client waiting on `id`.
    pub fn remove_pending_resource(&mut self, id: &str) -> SmallVec<[NodeId; 2]> {
        self.pending.remove(id).unwrap_or_default()
    }

    /// Forgets `client` in every pending list.
    pub fn remove_pending_client(&mut self, client: NodeId) {
        self.pending.retain(|_, clients| {
            clients.retain(|c| *c != client);
            !clients.is_empty()
        });
    }

    /// Returns whether `client` waits on any id.
    #[must_use]
    pub fn is_pending_client(&self, client: NodeId) -> bool {
        self.pending.values().any(|e| e.contains(&client))
    }

    /// Returns the number of ids with at least one registered container.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns whether no container is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(idx: u32) -> NodeId {
        NodeId { idx, generation: 0 }
    }

    #[test]
    fn first_registered_is_active() {
        let mut reg = ResourceRegistry::new();
        assert!(reg.add_resource("a", node(1)));
        assert!(!reg.add_resource("a", node(2)));
        assert_eq!(reg.resource("a"), Some(node(1)));

        assert!(reg.remove_resource("a", node(1)), "node 1 was active");
        assert_eq!(reg.resource("a"), Some(node(2)));
        assert!(!reg.remove_resource("a", node(7)));
        assert!(reg.remove_resource("a", node(2)));
        assert!(reg.is_empty());
    }

    #[test]
    fn pending_clients_are_taken_once() {
        let mut reg = ResourceRegistry::new();
        reg.add_pending_resource("p", node(3));
        reg.add_pending_resource("p", node(3));
        reg.add_pending_resource("p", node(4));
        assert!(reg.has_pending_resource("p"));

        let taken = reg.remove_pending_resource("p");
        assert_eq!(taken.as_slice(), &[node(3), node(4)]);
        assert!(!reg.has_pending_resource("p"));
        assert!(reg.remove_pending_resource("p").is_empty());
    }

    #[test]
    fn removing_a_client_purges_every_list() {
        let mut reg = ResourceRegistry::new();
        reg.add_pending_resource("a", node(3));
        reg.add_pending_resource("b", node(3));
        reg.add_pending_resource("b", node(4));
        reg.remove_pending_client(node(3));
        assert!(!reg.is_pending_client(node(3)));
        assert!(!reg.has_pending_resource("a"));
        assert!(reg.has_pending_resource("b"));
    }
}
