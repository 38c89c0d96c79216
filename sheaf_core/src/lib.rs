// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render tree, resource graph and layout for SVG content.
//!
//! `sheaf_core` models the renderable side of an SVG document: a tree of typed
//! render nodes, the resource containers (clip paths, masks, patterns,
//! gradients, filters, markers) those nodes reference, and the layout pass
//! that resolves their geometry. It is `no_std` compatible (with `alloc`) and
//! stores nodes in struct-of-arrays form behind generational handles.
//!
//! # Architecture
//!
//! ```text
//!   set_style / set_kind / set_transform / append_child
//!       │
//!       ├──► ResourceCache rebuild ──► container client lists
//!       │                                   │
//!       │           mark_all_clients_for_invalidation (worklist)
//!       ▼                                   │
//!   dirty channels (LAYOUT, PAINT, TOPOLOGY) ◄┘
//!       │
//!       ▼
//!   RenderTree::layout() ──► LayoutChanges (laid out, damage, layers)
//!       │
//!       ▼
//!   painters (sheaf_paint) ──► Canvas
//! ```
//!
//! **[`tree`]**: the node arena. Properties (kind, style, transform) are set
//! by the caller; bounding boxes, transforms and per-kind geometry are
//! computed by layout.
//!
//! **[`resource`]**: the per-document [`ResourceRegistry`](resource::ResourceRegistry),
//! the per-client [`SvgResources`](resource::SvgResources) records, cycle-safe
//! invalidation fan-out, and the lazily cached artifacts painters consume.
//!
//! **[`layout`]**: the layout pass, coordinate mapping across the host
//! boundary, and hit testing.
//!
//! **[`dirty`]**: multi-channel dirty tracking via `understory_dirty`.
//!
//! **[`style`]** and **[`length`]**: the computed style model and unit
//! resolution.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) and the zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-pass
//!   damage-rect events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod dirty;
pub mod error;
pub mod layout;
pub mod length;
pub mod resource;
pub mod style;
pub mod trace;
pub mod transform;
pub mod tree;
