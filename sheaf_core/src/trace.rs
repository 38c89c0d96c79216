// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for layout, invalidation and paint.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! tree instrumentation calls at each stage. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Events carry raw slot indices rather than [`NodeId`](crate::tree::NodeId)
//! handles so sinks can store them without lifetime concerns.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`DamageRect`] events plus the
//!   corresponding `TraceSink` method.

use crate::error::EffectError;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which pass is being traced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Layout (bounding boxes, transforms, resource container layout).
    Layout,
    /// Resource invalidation fan-out.
    Invalidate,
    /// Paint traversal.
    Paint,
}

/// Which effect a paint-time event refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Opacity / blend-mode / isolation layer.
    Compositing,
    /// `clip-path` (resource or inline shape).
    Clip,
    /// `mask`.
    Mask,
    /// `filter`.
    Filter,
    /// Fill or stroke paint server.
    PaintServer,
    /// A marker instance.
    Marker,
}

/// The outcome of establishing an effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectOutcome {
    /// Applied as a geometric clip path.
    AppliedPath,
    /// Applied through an offscreen mask.
    AppliedMask,
    /// Applied (effects without a path/mask distinction).
    Applied,
    /// Could not be applied; the node was skipped for this phase.
    Failed(EffectError),
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Marks the beginning of a pass.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Monotonic pass counter, shared by all phases of one update.
    pub pass_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
}

/// Marks the end of a pass.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
}

/// Emitted for every node laid out during a layout pass.
#[derive(Clone, Copy, Debug)]
pub struct NodeLayoutEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Slot index of the node.
    pub node_index: u32,
    /// Whether layout was forced by an ancestor (scale or viewport change).
    pub forced: bool,
    /// Whether the node's bounding boxes changed.
    pub boundaries_changed: bool,
}

/// Emitted once per container visited by an invalidation fan-out.
#[derive(Clone, Copy, Debug)]
pub struct InvalidationEvent {
    /// Slot index of the resource container.
    pub container_index: u32,
    /// Invalidation mode bit.
    pub mode_bits: u8,
    /// Number of clients marked.
    pub clients: u32,
    /// Number of composited client layers reported.
    pub layers: u32,
    /// Whether the container was skipped by the invalidation-mask guard.
    pub coalesced: bool,
}

/// Emitted when a paint-time effect is established (or fails to be).
#[derive(Clone, Copy, Debug)]
pub struct EffectEvent {
    /// Slot index of the node being painted.
    pub node_index: u32,
    /// Which effect.
    pub effect: EffectKind,
    /// What happened.
    pub outcome: EffectOutcome,
}

/// Emitted when a container registers under an id that clients were
/// waiting for.
#[derive(Clone, Copy, Debug)]
pub struct PendingResolvedEvent {
    /// Slot index of the newly registered container.
    pub container_index: u32,
    /// Number of clients that were revalidated.
    pub clients: u32,
}

/// Per-pass summary produced at the end of [`RenderTree::layout`].
///
/// [`RenderTree::layout`]: crate::tree::RenderTree::layout
#[derive(Clone, Copy, Debug, Default)]
pub struct LayoutSummary {
    /// Pass counter.
    pub pass_index: u64,
    /// Nodes laid out.
    pub laid_out: u32,
    /// Nodes whose bounding boxes changed.
    pub boundaries_changed: u32,
    /// Nodes that need a repaint.
    pub repaints: u32,
    /// Composited layers that need a repaint.
    pub layers: u32,
}

/// An axis-aligned damage rectangle in host pixels.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct DamageRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the render tree and painters.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called at the beginning of a pass.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a pass.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called for each node laid out.
    fn on_node_layout(&mut self, e: &NodeLayoutEvent) {
        _ = e;
    }

    /// Called for each container visited by an invalidation fan-out.
    fn on_invalidation(&mut self, e: &InvalidationEvent) {
        _ = e;
    }

    /// Called when a paint-time effect is established or fails.
    fn on_effect(&mut self, e: &EffectEvent) {
        _ = e;
    }

    /// Called when pending clients are resolved.
    fn on_pending_resolved(&mut self, e: &PendingResolvedEvent) {
        _ = e;
    }

    /// Called with the per-pass layout summary.
    fn on_layout_summary(&mut self, s: &LayoutSummary) {
        _ = s;
    }

    /// Called with per-pass damage rectangles (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_damage_rects(&mut self, pass_index: u64, rects: &[DamageRect]) {
        _ = (pass_index, rects);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`NodeLayoutEvent`].
    #[inline]
    pub fn node_layout(&mut self, e: &NodeLayoutEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_node_layout(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`InvalidationEvent`].
    #[inline]
    pub fn invalidation(&mut self, e: &InvalidationEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_invalidation(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`EffectEvent`].
    #[inline]
    pub fn effect(&mut self, e: &EffectEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_effect(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PendingResolvedEvent`].
    #[inline]
    pub fn pending_resolved(&mut self, e: &PendingResolvedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pending_resolved(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`LayoutSummary`].
    #[inline]
    pub fn layout_summary(&mut self, s: &LayoutSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_layout_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits damage rectangles (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn damage_rects(&mut self, pass_index: u64, rects: &[DamageRect]) {
        if let Some(s) = &mut self.sink {
            s.on_damage_rects(pass_index, rects);
        }
    }
}

// ---------------------------------------------------------------------------
// Buffered events
// ---------------------------------------------------------------------------

/// Events raised by tree mutations, held until the next layout pass reports
/// them under its `Invalidate` phase.
#[cfg(feature = "trace")]
#[derive(Clone, Debug, Default)]
pub(crate) struct PendingTrace {
    pub(crate) invalidations: alloc::vec::Vec<InvalidationEvent>,
    pub(crate) resolved: alloc::vec::Vec<PendingResolvedEvent>,
}

#[cfg(feature = "trace")]
impl PendingTrace {
    /// Sends the buffered events to `tracer` and clears the buffer.
    pub(crate) fn flush(&mut self, tracer: &mut Tracer<'_>) {
        for e in self.invalidations.drain(..) {
            tracer.invalidation(&e);
        }
        for e in self.resolved.drain(..) {
            tracer.pending_resolved(&e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
