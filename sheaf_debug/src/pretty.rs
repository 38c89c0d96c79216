// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Nodes and
//! containers are shown by slot index as `#n`.

use std::io::Write;

use sheaf_core::trace::{
    DamageRect, EffectEvent, EffectKind, EffectOutcome, InvalidationEvent, LayoutSummary,
    NodeLayoutEvent, PendingResolvedEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    layout_details: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("layout_details", &self.layout_details)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    ///
    /// Per-node layout lines are off; see
    /// [`with_layout_details`](Self::with_layout_details).
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            layout_details: false,
        }
    }

    /// Also prints one line for every node laid out.
    #[must_use]
    pub fn with_layout_details(mut self, enabled: bool) -> Self {
        self.layout_details = enabled;
        self
    }

    /// Consumes the sink and returns its writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Layout => "layout",
        PhaseKind::Invalidate => "invalidate",
        PhaseKind::Paint => "paint",
    }
}

fn effect_name(effect: EffectKind) -> &'static str {
    match effect {
        EffectKind::Compositing => "compositing",
        EffectKind::Clip => "clip",
        EffectKind::Mask => "mask",
        EffectKind::Filter => "filter",
        EffectKind::PaintServer => "paint-server",
        EffectKind::Marker => "marker",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] pass={} {}",
            e.pass_index,
            phase_name(e.phase),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] pass={} {}",
            e.pass_index,
            phase_name(e.phase),
        );
    }

    fn on_node_layout(&mut self, e: &NodeLayoutEvent) {
        if !self.layout_details {
            return;
        }
        let forced = if e.forced { " forced" } else { "" };
        let changed = if e.boundaries_changed { " changed" } else { "" };
        let _ = writeln!(
            self.writer,
            "[layout] pass={} #{}{forced}{changed}",
            e.pass_index, e.node_index,
        );
    }

    fn on_invalidation(&mut self, e: &InvalidationEvent) {
        if e.coalesced {
            let _ = writeln!(
                self.writer,
                "[invalidate] #{} mode={:#04b} coalesced",
                e.container_index, e.mode_bits,
            );
            return;
        }
        let _ = writeln!(
            self.writer,
            "[invalidate] #{} mode={:#04b} clients={} layers={}",
            e.container_index, e.mode_bits, e.clients, e.layers,
        );
    }

    fn on_effect(&mut self, e: &EffectEvent) {
        let outcome = match e.outcome {
            EffectOutcome::AppliedPath => "path".to_owned(),
            EffectOutcome::AppliedMask => "mask".to_owned(),
            EffectOutcome::Applied => "ok".to_owned(),
            EffectOutcome::Failed(err) => format!("FAILED ({err})"),
        };
        let _ = writeln!(
            self.writer,
            "[effect] #{} {} {outcome}",
            e.node_index,
            effect_name(e.effect),
        );
    }

    fn on_pending_resolved(&mut self, e: &PendingResolvedEvent) {
        let _ = writeln!(
            self.writer,
            "[resolved] #{} clients={}",
            e.container_index, e.clients,
        );
    }

    fn on_layout_summary(&mut self, s: &LayoutSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] pass={} laid_out={} changed={} repaints={} layers={}",
            s.pass_index, s.laid_out, s.boundaries_changed, s.repaints, s.layers,
        );
    }

    fn on_damage_rects(&mut self, pass_index: u64, rects: &[DamageRect]) {
        let _ = writeln!(
            self.writer,
            "[damage] pass={pass_index} rects={}",
            rects.len(),
        );
    }
}
