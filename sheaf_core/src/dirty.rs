// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Sheaf uses multi-channel dirty tracking (via [`understory_dirty`]) to
//! propagate layout and repaint requests through the render tree. Each
//! channel represents an independent category of change.
//!
//! # Propagation semantics
//!
//! - **Ancestor-propagating**: [`LAYOUT`] uses
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) with dependency edges
//!   under which each parent depends on its children. Marking a node dirty
//!   marks every ancestor up to its root, because a container's bounding
//!   boxes are aggregated from its children and the layout pass must reach
//!   the dirty node from the root.
//!
//! - **Local-only**: [`PAINT`] is marked with the default policy. Only the
//!   node that asked for a repaint appears in the drain output.
//!
//! - **Structural**: [`TOPOLOGY`] is marked on add/remove child and on
//!   create/destroy. It is drained and reported by the layout pass but does
//!   not propagate.
//!
//! The per-node boolean flags (`needs_layout`, `needs_boundaries_update`,
//! `needs_transform_update`) are seeded from the [`LAYOUT`] drain at the start
//! of [`RenderTree::layout`](crate::tree::RenderTree::layout) and are all
//! false again when it returns.

use understory_dirty::Channel;

/// Geometry or structure changed; the node and its ancestors need layout.
pub const LAYOUT: Channel = Channel::new(0);

/// Paint-only change; the node needs a repaint without layout.
pub const PAINT: Channel = Channel::new(1);

/// Tree topology changed.
pub const TOPOLOGY: Channel = Channel::new(2);
