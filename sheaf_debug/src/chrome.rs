// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Recordings carry no wall-clock time, so events are laid out on a logical
//! clock: the n-th recorded event is placed at `n` microseconds. Phases nest
//! as duration events, everything else is an instant.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, RecordedFailure, RecordedOutcome, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for (ts, recorded) in decode(bytes).enumerate() {
        match recorded {
            RecordedEvent::PhaseBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": format!("{:?}", e.phase),
                    "cat": "Pass",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "pass_index": e.pass_index,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": format!("{:?}", e.phase),
                    "cat": "Pass",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "pass_index": e.pass_index,
                    }
                }));
            }
            RecordedEvent::NodeLayout(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "NodeLayout",
                    "cat": "Layout",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "pass_index": e.pass_index,
                        "node": e.node_index,
                        "forced": e.forced,
                        "boundaries_changed": e.boundaries_changed,
                    }
                }));
            }
            RecordedEvent::Invalidation(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Invalidation",
                    "cat": "Resource",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "container": e.container_index,
                        "mode_bits": e.mode_bits,
                        "clients": e.clients,
                        "layers": e.layers,
                        "coalesced": e.coalesced,
                    }
                }));
            }
            RecordedEvent::Effect {
                node_index,
                effect,
                outcome,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{effect:?}"),
                    "cat": "Effect",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "node": node_index,
                        "outcome": outcome_args(outcome),
                    }
                }));
            }
            RecordedEvent::PendingResolved(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "PendingResolved",
                    "cat": "Resource",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "container": e.container_index,
                        "clients": e.clients,
                    }
                }));
            }
            RecordedEvent::LayoutSummary(s) => {
                events.push(json!({
                    "ph": "i",
                    "name": "LayoutSummary",
                    "cat": "Summary",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "pass_index": s.pass_index,
                        "laid_out": s.laid_out,
                        "boundaries_changed": s.boundaries_changed,
                        "repaints": s.repaints,
                        "layers": s.layers,
                    }
                }));
            }
            RecordedEvent::DamageRectsCount { pass_index, count } => {
                events.push(json!({
                    "ph": "i",
                    "name": "DamageRects",
                    "cat": "Rich",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "pass_index": pass_index,
                        "count": count,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn outcome_args(outcome: RecordedOutcome) -> Value {
    match outcome {
        RecordedOutcome::AppliedPath => json!("path"),
        RecordedOutcome::AppliedMask => json!("mask"),
        RecordedOutcome::Applied => json!("applied"),
        RecordedOutcome::Failed(f) => match f {
            RecordedFailure::NotLaidOut(c) => json!({ "failed": "NotLaidOut", "container": c }),
            RecordedFailure::ReferenceCycle(c) => {
                json!({ "failed": "ReferenceCycle", "container": c })
            }
            other => json!({ "failed": format!("{other:?}") }),
        },
    }
}
