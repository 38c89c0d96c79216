// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Effect failures keep the slot index of the offending container rather
//! than its [`NodeId`](sheaf_core::tree::NodeId), and
//! [`on_damage_rects`](TraceSink::on_damage_rects) stores only the count.

use sheaf_core::error::EffectError;
use sheaf_core::trace::{
    DamageRect, EffectEvent, EffectKind, EffectOutcome, InvalidationEvent, LayoutSummary,
    NodeLayoutEvent, PendingResolvedEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PHASE_BEGIN: u8 = 1;
const TAG_PHASE_END: u8 = 2;
const TAG_NODE_LAYOUT: u8 = 3;
const TAG_INVALIDATION: u8 = 4;
const TAG_EFFECT: u8 = 5;
const TAG_PENDING_RESOLVED: u8 = 6;
const TAG_LAYOUT_SUMMARY: u8 = 7;
const TAG_DAMAGE_RECTS_COUNT: u8 = 8;

// ---------------------------------------------------------------------------
// Recorded outcomes
// ---------------------------------------------------------------------------

/// Why an effect failed, as recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordedFailure {
    /// [`EffectError::MissingResource`].
    MissingResource,
    /// [`EffectError::NotLaidOut`], with the container's slot index.
    NotLaidOut(u32),
    /// [`EffectError::EmptyGeometry`].
    EmptyGeometry,
    /// [`EffectError::ReferenceCycle`], with the container's slot index.
    ReferenceCycle(u32),
    /// [`EffectError::NonInvertibleTransform`].
    NonInvertibleTransform,
}

impl From<EffectError> for RecordedFailure {
    fn from(e: EffectError) -> Self {
        match e {
            EffectError::MissingResource => Self::MissingResource,
            EffectError::NotLaidOut(id) => Self::NotLaidOut(id.index()),
            EffectError::EmptyGeometry => Self::EmptyGeometry,
            EffectError::ReferenceCycle(id) => Self::ReferenceCycle(id.index()),
            EffectError::NonInvertibleTransform => Self::NonInvertibleTransform,
        }
    }
}

/// The outcome of an effect, as recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordedOutcome {
    /// [`EffectOutcome::AppliedPath`].
    AppliedPath,
    /// [`EffectOutcome::AppliedMask`].
    AppliedMask,
    /// [`EffectOutcome::Applied`].
    Applied,
    /// [`EffectOutcome::Failed`].
    Failed(RecordedFailure),
}

impl From<EffectOutcome> for RecordedOutcome {
    fn from(outcome: EffectOutcome) -> Self {
        match outcome {
            EffectOutcome::AppliedPath => Self::AppliedPath,
            EffectOutcome::AppliedMask => Self::AppliedMask,
            EffectOutcome::Applied => Self::Applied,
            EffectOutcome::Failed(e) => Self::Failed(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Layout => 0,
            PhaseKind::Invalidate => 1,
            PhaseKind::Paint => 2,
        });
    }

    fn write_effect_kind(&mut self, k: EffectKind) {
        self.write_u8(match k {
            EffectKind::Compositing => 0,
            EffectKind::Clip => 1,
            EffectKind::Mask => 2,
            EffectKind::Filter => 3,
            EffectKind::PaintServer => 4,
            EffectKind::Marker => 5,
        });
    }

    /// Writes the outcome as `[outcome, failure, index]`; unused fields are
    /// zero so every effect record has the same size.
    fn write_outcome(&mut self, outcome: RecordedOutcome) {
        let (code, failure, index) = match outcome {
            RecordedOutcome::AppliedPath => (0, 0, 0),
            RecordedOutcome::AppliedMask => (1, 0, 0),
            RecordedOutcome::Applied => (2, 0, 0),
            RecordedOutcome::Failed(f) => match f {
                RecordedFailure::MissingResource => (3, 0, 0),
                RecordedFailure::NotLaidOut(i) => (3, 1, i),
                RecordedFailure::EmptyGeometry => (3, 2, 0),
                RecordedFailure::ReferenceCycle(i) => (3, 3, i),
                RecordedFailure::NonInvertibleTransform => (3, 4, 0),
            },
        };
        self.write_u8(code);
        self.write_u8(failure);
        self.write_u32(index);
    }
}

impl TraceSink for RecorderSink {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.pass_index);
        self.write_phase(e.phase);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.pass_index);
        self.write_phase(e.phase);
    }

    fn on_node_layout(&mut self, e: &NodeLayoutEvent) {
        self.write_u8(TAG_NODE_LAYOUT);
        self.write_u64(e.pass_index);
        self.write_u32(e.node_index);
        self.write_bool(e.forced);
        self.write_bool(e.boundaries_changed);
    }

    fn on_invalidation(&mut self, e: &InvalidationEvent) {
        self.write_u8(TAG_INVALIDATION);
        self.write_u32(e.container_index);
        self.write_u8(e.mode_bits);
        self.write_u32(e.clients);
        self.write_u32(e.layers);
        self.write_bool(e.coalesced);
    }

    fn on_effect(&mut self, e: &EffectEvent) {
        self.write_u8(TAG_EFFECT);
        self.write_u32(e.node_index);
        self.write_effect_kind(e.effect);
        self.write_outcome(e.outcome.into());
    }

    fn on_pending_resolved(&mut self, e: &PendingResolvedEvent) {
        self.write_u8(TAG_PENDING_RESOLVED);
        self.write_u32(e.container_index);
        self.write_u32(e.clients);
    }

    fn on_layout_summary(&mut self, s: &LayoutSummary) {
        self.write_u8(TAG_LAYOUT_SUMMARY);
        self.write_u64(s.pass_index);
        self.write_u32(s.laid_out);
        self.write_u32(s.boundaries_changed);
        self.write_u32(s.repaints);
        self.write_u32(s.layers);
    }

    fn on_damage_rects(&mut self, pass_index: u64, rects: &[DamageRect]) {
        self.write_u8(TAG_DAMAGE_RECTS_COUNT);
        self.write_u64(pass_index);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "damage rect count capped at u32::MAX for recording"
        )]
        self.write_u32(rects.len().min(u32::MAX as usize) as u32);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`NodeLayoutEvent`].
    NodeLayout(NodeLayoutEvent),
    /// An [`InvalidationEvent`].
    Invalidation(InvalidationEvent),
    /// An [`EffectEvent`].
    Effect {
        /// Slot index of the node being painted.
        node_index: u32,
        /// Which effect.
        effect: EffectKind,
        /// What happened.
        outcome: RecordedOutcome,
    },
    /// A [`PendingResolvedEvent`].
    PendingResolved(PendingResolvedEvent),
    /// A [`LayoutSummary`].
    LayoutSummary(LayoutSummary),
    /// Damage-rect count for a pass.
    DamageRectsCount {
        /// Pass counter.
        pass_index: u64,
        /// Number of damage rects.
        count: u32,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Layout,
            1 => PhaseKind::Invalidate,
            _ => PhaseKind::Paint,
        })
    }

    fn read_effect_kind(&mut self) -> Option<EffectKind> {
        Some(match self.read_u8()? {
            0 => EffectKind::Compositing,
            1 => EffectKind::Clip,
            2 => EffectKind::Mask,
            3 => EffectKind::Filter,
            4 => EffectKind::PaintServer,
            _ => EffectKind::Marker,
        })
    }

    fn read_outcome(&mut self) -> Option<RecordedOutcome> {
        let code = self.read_u8()?;
        let failure = self.read_u8()?;
        let index = self.read_u32()?;
        Some(match code {
            0 => RecordedOutcome::AppliedPath,
            1 => RecordedOutcome::AppliedMask,
            2 => RecordedOutcome::Applied,
            _ => RecordedOutcome::Failed(match failure {
                0 => RecordedFailure::MissingResource,
                1 => RecordedFailure::NotLaidOut(index),
                2 => RecordedFailure::EmptyGeometry,
                3 => RecordedFailure::ReferenceCycle(index),
                _ => RecordedFailure::NonInvertibleTransform,
            }),
        })
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            pass_index: self.read_u64()?,
            phase: self.read_phase()?,
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            pass_index: self.read_u64()?,
            phase: self.read_phase()?,
        }))
    }

    fn decode_node_layout(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::NodeLayout(NodeLayoutEvent {
            pass_index: self.read_u64()?,
            node_index: self.read_u32()?,
            forced: self.read_bool()?,
            boundaries_changed: self.read_bool()?,
        }))
    }

    fn decode_invalidation(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Invalidation(InvalidationEvent {
            container_index: self.read_u32()?,
            mode_bits: self.read_u8()?,
            clients: self.read_u32()?,
            layers: self.read_u32()?,
            coalesced: self.read_bool()?,
        }))
    }

    fn decode_effect(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Effect {
            node_index: self.read_u32()?,
            effect: self.read_effect_kind()?,
            outcome: self.read_outcome()?,
        })
    }

    fn decode_pending_resolved(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PendingResolved(PendingResolvedEvent {
            container_index: self.read_u32()?,
            clients: self.read_u32()?,
        }))
    }

    fn decode_layout_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::LayoutSummary(LayoutSummary {
            pass_index: self.read_u64()?,
            laid_out: self.read_u32()?,
            boundaries_changed: self.read_u32()?,
            repaints: self.read_u32()?,
            layers: self.read_u32()?,
        }))
    }

    fn decode_damage_rects_count(&mut self) -> Option<RecordedEvent> {
        let pass_index = self.read_u64()?;
        let count = self.read_u32()?;
        Some(RecordedEvent::DamageRectsCount { pass_index, count })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_NODE_LAYOUT => self.decode_node_layout(),
            TAG_INVALIDATION => self.decode_invalidation(),
            TAG_EFFECT => self.decode_effect(),
            TAG_PENDING_RESOLVED => self.decode_pending_resolved(),
            TAG_LAYOUT_SUMMARY => self.decode_layout_summary(),
            TAG_DAMAGE_RECTS_COUNT => self.decode_damage_rects_count(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use sheaf_core::style::ComputedStyle;
    use sheaf_core::trace::Tracer;
    use sheaf_core::tree::{NodeKind, RenderTree, RootData, ShapeGeometry};

    use super::*;

    #[test]
    fn effect_failure_keeps_the_container_index() {
        let mut tree = RenderTree::new();
        let root = tree.create_node(NodeKind::Root(RootData::default()), ComputedStyle::default());
        let container = tree.create_node(
            NodeKind::Shape(ShapeGeometry::rect(0.0, 0.0, 1.0, 1.0)),
            ComputedStyle::default(),
        );
        tree.append_child(root, container);

        let mut rec = RecorderSink::new();
        rec.on_effect(&EffectEvent {
            node_index: 9,
            effect: EffectKind::Mask,
            outcome: EffectOutcome::Failed(EffectError::ReferenceCycle(container)),
        });
        rec.on_effect(&EffectEvent {
            node_index: 9,
            effect: EffectKind::Filter,
            outcome: EffectOutcome::Failed(EffectError::EmptyGeometry),
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            RecordedEvent::Effect {
                node_index,
                effect,
                outcome,
            } => {
                assert_eq!(*node_index, 9);
                assert_eq!(*effect, EffectKind::Mask);
                assert_eq!(
                    *outcome,
                    RecordedOutcome::Failed(RecordedFailure::ReferenceCycle(container.index()))
                );
            }
            other => panic!("expected Effect, got {other:?}"),
        }
        assert!(matches!(
            events[1],
            RecordedEvent::Effect {
                outcome: RecordedOutcome::Failed(RecordedFailure::EmptyGeometry),
                ..
            }
        ));
    }

    #[test]
    fn layout_pass_records_in_order() {
        let mut tree = RenderTree::new();
        let root = tree.create_node(NodeKind::Root(RootData::default()), ComputedStyle::default());
        let rect = tree.create_node(
            NodeKind::Shape(ShapeGeometry::rect(0.0, 0.0, 10.0, 10.0)),
            ComputedStyle::default(),
        );
        tree.append_child(root, rect);

        let mut rec = RecorderSink::new();
        let changes = tree.layout_with_tracer(&mut Tracer::new(&mut rec));

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert!(matches!(
            events.first(),
            Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
                phase: PhaseKind::Layout,
                ..
            }))
        ));
        let laid_out = events
            .iter()
            .filter(|e| matches!(e, RecordedEvent::NodeLayout(_)))
            .count();
        assert_eq!(laid_out, changes.laid_out.len());
        let Some(RecordedEvent::LayoutSummary(recorded)) = events
            .iter()
            .find(|e| matches!(e, RecordedEvent::LayoutSummary(_)))
        else {
            panic!("no layout summary recorded");
        };
        assert_eq!(recorded.pass_index, tree.pass_index());
        assert_eq!(recorded.laid_out as usize, changes.laid_out.len());
        assert_eq!(
            recorded.boundaries_changed as usize,
            changes.boundaries_changed.len()
        );
    }

    #[test]
    fn invalidation_round_trips() {
        let mut rec = RecorderSink::new();
        rec.on_invalidation(&InvalidationEvent {
            container_index: 4,
            mode_bits: 0b10,
            clients: 3,
            layers: 1,
            coalesced: true,
        });
        rec.on_pending_resolved(&PendingResolvedEvent {
            container_index: 4,
            clients: 2,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        let RecordedEvent::Invalidation(e) = &events[0] else {
            panic!("expected Invalidation, got {:?}", events[0]);
        };
        assert_eq!(e.mode_bits, 0b10);
        assert_eq!(e.clients, 3);
        assert!(e.coalesced);
        assert!(matches!(
            events[1],
            RecordedEvent::PendingResolved(PendingResolvedEvent { clients: 2, .. })
        ));
    }

    #[test]
    fn truncated_record_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_phase_begin(&PhaseBeginEvent {
            pass_index: 1,
            phase: PhaseKind::Paint,
        });
        rec.on_phase_end(&PhaseEndEvent {
            pass_index: 1,
            phase: PhaseKind::Paint,
        });
        let bytes = rec.into_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }

    #[test]
    fn damage_rects_count() {
        let mut rec = RecorderSink::new();
        let rects = [
            DamageRect {
                x: 0,
                y: 0,
                width: 10,
                height: 10,
            },
            DamageRect {
                x: 5,
                y: 5,
                width: 1,
                height: 1,
            },
        ];
        rec.on_damage_rects(42, &rects);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::DamageRectsCount { pass_index, count } => {
                assert_eq!(*pass_index, 42);
                assert_eq!(*count, 2);
            }
            other => panic!("expected DamageRectsCount, got {other:?}"),
        }
    }
}
