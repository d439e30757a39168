//! Per-stream trigger decision.
//!
//! Each configured stream is evaluated once per run:
//!
//! ```text
//! active? ──no──▶ Inactive
//!    │
//! read progress log ──unreadable / no DTG= line──▶ ProgressUnknown
//!    │
//! parse YYYYMMDDHH ──invalid──▶ ParseFailed
//!    │
//! month == 12? ──no──▶ NotDecember
//!    │
//! Triggered: dispatch next_year = year + 1
//! ```
//!
//! All memory between runs lives in the external progress log; nothing here
//! is persisted. A terminal state on one stream never stops the others.

use std::collections::BTreeMap;

use serde::Serialize;

use carra2_core::{Dtg, StreamConfig, StreamId};

use crate::dispatch::{DispatchReport, Dispatcher};
use crate::progress;

/// Where a stream ended up in this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StreamState {
    Inactive,
    ProgressUnknown { reason: String },
    ParseFailed { value: String, reason: String },
    NotDecember { dtg: Dtg },
    Triggered { dtg: Dtg, dispatch: DispatchReport },
}

impl StreamState {
    pub fn is_failure(&self) -> bool {
        match self {
            StreamState::ProgressUnknown { .. } | StreamState::ParseFailed { .. } => true,
            StreamState::Triggered { dispatch, .. } => dispatch.has_failures(),
            StreamState::Inactive | StreamState::NotDecember { .. } => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamOutcome {
    pub stream: StreamId,
    #[serde(flatten)]
    pub state: StreamState,
}

/// Structured result of one orchestrator run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub streams: Vec<StreamOutcome>,
}

impl RunReport {
    /// `true` when any stream or dataset failed.
    pub fn has_failures(&self) -> bool {
        self.streams.iter().any(|s| s.state.is_failure())
    }

    pub fn failure_count(&self) -> usize {
        self.streams.iter().filter(|s| s.state.is_failure()).count()
    }

    pub fn triggered_count(&self) -> usize {
        self.streams
            .iter()
            .filter(|s| matches!(s.state, StreamState::Triggered { .. }))
            .count()
    }

    /// Staging failures tolerated across all dispatches.
    pub fn staging_warnings(&self) -> usize {
        self.streams
            .iter()
            .map(|s| match &s.state {
                StreamState::Triggered { dispatch, .. } => dispatch.staging_warnings(),
                _ => 0,
            })
            .sum()
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Evaluate one stream and run its December dispatch when due.
pub fn evaluate_stream(stream: &StreamId, config: &StreamConfig, dispatcher: &Dispatcher<'_>) -> StreamState {
    if !config.active {
        tracing::info!(stream = %stream, "stream is inactive, skipping");
        return StreamState::Inactive;
    }

    let Some(log_path) = config.progress_log_path(stream) else {
        let reason = "no PROGLOG or USER configured".to_string();
        tracing::warn!(stream = %stream, %reason, "failed to check progress");
        return StreamState::ProgressUnknown { reason };
    };

    let raw = match progress::read_marker_at(&log_path) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(stream = %stream, error = %err, "failed to check progress");
            return StreamState::ProgressUnknown {
                reason: err.to_string(),
            };
        }
    };

    let dtg: Dtg = match raw.parse() {
        Ok(dtg) => dtg,
        Err(err) => {
            tracing::warn!(stream = %stream, value = %raw, error = %err, "failed to parse DTG");
            return StreamState::ParseFailed {
                value: raw,
                reason: err.to_string(),
            };
        }
    };

    if !dtg.is_december() {
        tracing::info!(stream = %stream, dtg = %dtg, "no action needed");
        return StreamState::NotDecember { dtg };
    }

    let next_year = dtg.next_year();
    tracing::info!(stream = %stream, dtg = %dtg, year = next_year, "December reached, preparing next year");
    let dispatch = dispatcher.dispatch_year(next_year);
    if dispatch.has_failures() {
        tracing::error!(stream = %stream, year = next_year, "December actions failed");
    }
    StreamState::Triggered { dtg, dispatch }
}

/// Evaluate every stream in order.
pub fn run_streams<'s>(
    streams: impl IntoIterator<Item = (&'s StreamId, &'s StreamConfig)>,
    dispatcher: &Dispatcher<'_>,
) -> RunReport {
    let mut report = RunReport::default();
    for (stream, config) in streams {
        let state = evaluate_stream(stream, config, dispatcher);
        report.streams.push(StreamOutcome {
            stream: stream.clone(),
            state,
        });
    }
    report
}

/// Convenience: evaluate every stream of a `STREAMS` map.
pub fn run_all(streams: &BTreeMap<StreamId, StreamConfig>, dispatcher: &Dispatcher<'_>) -> RunReport {
    run_streams(streams.iter(), dispatcher)
}
