// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint orchestration for [`sheaf_core`] render trees.
//!
//! Painting walks a laid-out tree and describes every node as calls on a
//! [`Canvas`]. Around each node's content the painter opens its effects in a
//! fixed order, outermost first:
//!
//! 1. a compositing layer for opacity, blend mode or isolation,
//! 2. the clip-path, as a canvas clip or as a recorded alpha mask,
//! 3. the mask,
//! 4. the filter,
//!
//! and closes them innermost first. Each opened scope pushes an
//! [`UndoAction`] so the scopes are closed on every path, including when an
//! effect fails part-way and the node is skipped.
//!
//! Clip, mask and pattern content is recorded once as a picture and cached
//! on the tree; a resource that is reached again while it is being applied
//! is a reference cycle and is not applied.
//!
//! This crate defines:
//!
//! - [`Canvas`], [`Brush`] and [`LayerStyle`]: the backend contract
//! - [`paint`] and [`paint_with_tracer`]: the traversal
//! - [`RecordingCanvas`]: a display-list canvas for tests and tooling
//! - [`ScopeStack`]: the undo stack that keeps canvas scopes balanced
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Reports effect outcomes to a
//!   [`TraceSink`](sheaf_core::trace::TraceSink).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

mod canvas;
mod clipper;
mod context;
mod filter;
mod marker;
mod masker;
mod paint_server;
mod painter;
mod recording;
mod scope;

pub use canvas::{Brush, Canvas, LayerStyle};
pub use clipper::ClipState;
pub use context::PaintStats;
pub use paint_server::PaintSlot;
pub use painter::{PaintPhase, paint, paint_with_tracer};
pub use recording::{Command, CommandKind, RecordingCanvas};
pub use scope::{ScopeMark, ScopeStack, UndoAction};
