// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render tree data model.
//!
//! A *node* is one SVG-renderable element's layout and paint state. Each node
//! has:
//!
//! - An identity ([`NodeId`]), a generational handle that becomes stale when
//!   the node is destroyed.
//! - Topology: parent, first-child, and sibling links forming an ordered tree.
//! - **Properties** set by the caller: [`kind`](RenderTree::set_kind),
//!   [`style`](RenderTree::set_style) and
//!   [`transform`](RenderTree::set_transform).
//! - **Computed properties** produced by [`layout`](RenderTree::layout):
//!   object and stroke bounding boxes, the paint-invalidation (visual) rect,
//!   the local-to-parent transform and per-kind [`NodeGeometry`].
//!
//! Node kinds form a closed set ([`NodeKind`]) dispatched with `match`; the
//! common fields live in parallel arrays so that invariants such as
//! "transform dirty implies boundaries dirty" are enforced in one place.
//!
//! # Dirty tracking
//!
//! Mutations mark the channels in [`dirty`](crate::dirty): layout-affecting
//! changes mark the node and, through dependency edges, every ancestor;
//! repaint-only changes mark just the node.

mod geometry;
mod id;
mod kind;
mod shape;
mod store;
mod text;
mod traverse;
mod viewport;

pub use geometry::{ImagePlacement, NodeGeometry, ShapeLayout, SpanLayout};
pub use id::{INVALID, ImageKey, LayerKey, NodeId, PictureId};
pub use kind::{ForeignObjectData, ImageData, NodeKind, RootData, ViewportData};
pub use shape::{MarkerVertex, ShapeGeometry, VertexRole, marker_vertices};
pub use store::{HostBox, LayoutFlags, RenderTree, TreeConfig};
pub use text::{TextData, TextSpanData};
pub use traverse::{Ancestors, Children, ChildrenRev};
pub use viewport::{Align, MeetOrSlice, PreserveAspectRatio};
