// src/engine/core.rs

//! Pure progress state machine.
//!
//! This module contains a synchronous, deterministic core that consumes log
//! buffers and produces the progress updates the IO shell should deliver:
//! - one update per tick at most, and only when `(progress, message)` changed
//! - a single heartbeat when the log is silent but a total is known
//! - the final and error updates when the operation settles
//!
//! The async shell (`engine::runtime::Orchestrator`) is responsible for:
//! - the timer, the working directory and the collector
//! - handing updates to the notification sink
//!
//! The core has no Tokio types and performs no IO, so it can be tested with
//! plain vectors of log lines.

use crate::discovery::DiscoveryInfo;
use crate::progress::{ProgressSnapshot, extract_progress};
use crate::notify::ProgressUpdate;

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Discovering,
    Running,
    Succeeded,
    Failed,
}

impl RunPhase {
    /// Whether `self -> next` is a legal transition.
    pub fn can_advance_to(self, next: RunPhase) -> bool {
        matches!(
            (self, next),
            (RunPhase::Idle, RunPhase::Discovering)
                | (RunPhase::Idle, RunPhase::Running)
                | (RunPhase::Discovering, RunPhase::Running)
                | (RunPhase::Running, RunPhase::Succeeded)
                | (RunPhase::Running, RunPhase::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunPhase::Succeeded | RunPhase::Failed)
    }
}

/// Saturating `usize -> u64` for counts crossing the notification boundary.
pub fn count_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// Per-run progress state.
#[derive(Debug, Clone)]
pub struct ProgressCore {
    known_total: Option<u64>,
    initial_message: Option<String>,
    fallback_message: String,
    /// Last `(progress, message)` pair handed to the sink.
    last_dispatched: Option<(u64, String)>,
    /// Progress derived at the most recent tick with log growth.
    last_progress: u64,
    /// Buffer length seen at the previous tick.
    seen_lines: usize,
    /// Buffer length at the previous delivery; lines after it are "new".
    delivered_lines: usize,
    ticks: u64,
}

impl ProgressCore {
    pub fn new(discovery: Option<&DiscoveryInfo>, fallback_message: impl Into<String>) -> Self {
        Self {
            known_total: discovery.map(|d| d.total),
            initial_message: discovery
                .map(|d| d.message.clone())
                .filter(|m| !m.is_empty()),
            fallback_message: fallback_message.into(),
            last_dispatched: None,
            last_progress: 0,
            seen_lines: 0,
            delivered_lines: 0,
            ticks: 0,
        }
    }

    pub fn known_total(&self) -> Option<u64> {
        self.known_total
    }

    pub fn initial_message(&self) -> Option<&str> {
        self.initial_message.as_deref()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn heartbeat_message(&self) -> String {
        self.initial_message
            .clone()
            .unwrap_or_else(|| self.fallback_message.clone())
    }

    /// The update announcing the start of a run: `{progress: 0, total?, message?}`.
    ///
    /// Recorded for dedup so an immediate heartbeat does not repeat it.
    pub fn initial_update(&mut self) -> ProgressUpdate {
        self.last_dispatched = Some((0, self.heartbeat_message()));
        ProgressUpdate {
            progress: 0,
            total: self.known_total,
            message: self.initial_message.clone(),
            new_log_lines: Vec::new(),
        }
    }

    /// Progress value for a snapshot taken while running.
    pub fn running_progress(snapshot: &ProgressSnapshot) -> u64 {
        if snapshot.completed_count > 0 {
            snapshot.completed_count
        } else {
            snapshot.current_index.unwrap_or(0)
        }
    }

    /// Handle one timer tick over the full buffer `logs`.
    ///
    /// Returns the update to deliver, or `None` when nothing changed.
    pub fn tick(&mut self, logs: &[String]) -> Option<ProgressUpdate> {
        self.ticks += 1;

        let grew = logs.len() > self.seen_lines;
        self.seen_lines = logs.len();

        let (progress, message) = if grew {
            let snapshot = extract_progress(logs, self.known_total);
            let progress = Self::running_progress(&snapshot);
            self.last_progress = progress;
            let message = if snapshot.message.is_empty() {
                self.fallback_message.clone()
            } else {
                snapshot.message
            };
            (progress, message)
        } else if self.known_total.is_some() {
            (self.last_progress, self.heartbeat_message())
        } else {
            return None;
        };

        if self
            .last_dispatched
            .as_ref()
            .is_some_and(|(p, m)| *p == progress && *m == message)
        {
            return None;
        }

        self.last_dispatched = Some((progress, message.clone()));
        let new_log_lines = self.take_new_lines(logs);

        Some(ProgressUpdate {
            progress,
            total: self.known_total,
            message: Some(message),
            new_log_lines,
        })
    }

    /// The update sent once after a successful settle.
    pub fn final_update(
        &mut self,
        logs: &[String],
        message: impl Into<String>,
    ) -> (ProgressSnapshot, ProgressUpdate) {
        let snapshot = extract_progress(logs, self.known_total);
        let progress = if snapshot.completed_count > 0 {
            snapshot.completed_count
        } else {
            self.known_total.unwrap_or_else(|| count_u64(logs.len()))
        };
        let total = self.known_total.unwrap_or(progress);
        let new_log_lines = self.take_new_lines(logs);

        let update = ProgressUpdate {
            progress,
            total: Some(total),
            message: Some(message.into()),
            new_log_lines,
        };
        (snapshot, update)
    }

    /// The update sent once after a failure.
    pub fn error_update(&mut self, logs: &[String], error_message: &str) -> ProgressUpdate {
        let new_log_lines = self.take_new_lines(logs);
        ProgressUpdate {
            progress: count_u64(logs.len()),
            total: self.known_total,
            message: Some(format!("Error: {error_message}")),
            new_log_lines,
        }
    }

    /// Lines past the delivery cursor; advances the cursor.
    fn take_new_lines(&mut self, logs: &[String]) -> Vec<String> {
        let new_lines = logs
            .get(self.delivered_lines..)
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        self.delivered_lines = logs.len();
        new_lines
    }
}
