// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, NodeId};
use super::store::RenderTree;

/// An iterator over the direct children of a node, in tree order.
///
/// Created by [`RenderTree::children`].
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a RenderTree,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a RenderTree, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.next_sibling[idx as usize];
        Some(self.tree.id_at(idx))
    }
}

/// An iterator over the direct children of a node, last child first.
///
/// Hit testing walks children in this order so that the topmost painted
/// node wins. Created by [`RenderTree::children_rev`].
#[derive(Debug)]
pub struct ChildrenRev<'a> {
    tree: &'a RenderTree,
    current: u32,
}

impl<'a> ChildrenRev<'a> {
    pub(crate) fn new(tree: &'a RenderTree, parent: u32) -> Self {
        let mut last = tree.first_child[parent as usize];
        if last != INVALID {
            while tree.next_sibling[last as usize] != INVALID {
                last = tree.next_sibling[last as usize];
            }
        }
        Self {
            tree,
            current: last,
        }
    }
}

impl Iterator for ChildrenRev<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.prev_sibling[idx as usize];
        Some(self.tree.id_at(idx))
    }
}

/// An iterator over the strict ancestors of a node, nearest first.
///
/// Created by [`RenderTree::ancestors`].
#[derive(Debug)]
pub struct Ancestors<'a> {
    tree: &'a RenderTree,
    current: u32,
}

impl<'a> Ancestors<'a> {
    pub(crate) fn new(tree: &'a RenderTree, idx: u32) -> Self {
        Self {
            tree,
            current: tree.parent[idx as usize],
        }
    }
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.parent[idx as usize];
        Some(self.tree.id_at(idx))
    }
}
