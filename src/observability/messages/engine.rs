// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for process run lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Run start and completion
//! * Rejection of invalid processes
//! * Errors recorded while a run is in flight
//! * Aggregator joins left open when a run ends

use crate::errors::ErrorKind;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A process run is starting.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use phaseflow::observability::messages::engine::RunStarted;
///
/// let msg = RunStarted {
///     process: "checkout",
///     node_count: 5,
///     observer_count: 0,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct RunStarted<'a> {
    pub process: &'a str,
    pub node_count: usize,
    pub observer_count: usize,
}

impl Display for RunStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting process '{}': {} nodes, {} observers",
            self.process, self.node_count, self.observer_count
        )
    }
}

impl StructuredLog for RunStarted<'_> {
    fn log(&self) {
        tracing::info!(
            process = self.process,
            node_count = self.node_count,
            observer_count = self.observer_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run",
            span_name = name,
            process = self.process,
            node_count = self.node_count,
        )
    }
}

/// A process run finished. Partial failures are counted, not fatal.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use phaseflow::observability::messages::engine::RunCompleted;
/// use std::time::Duration;
///
/// let msg = RunCompleted {
///     process: "checkout",
///     result_count: 2,
///     error_count: 0,
///     duration: Duration::from_millis(12),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct RunCompleted<'a> {
    pub process: &'a str,
    pub result_count: usize,
    pub error_count: usize,
    pub duration: std::time::Duration,
}

impl Display for RunCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Process '{}' completed: {} results, {} errors in {:?}",
            self.process, self.result_count, self.error_count, self.duration
        )
    }
}

impl StructuredLog for RunCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            process = self.process,
            result_count = self.result_count,
            error_count = self.error_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run_completed",
            span_name = name,
            process = self.process,
            result_count = self.result_count,
            error_count = self.error_count,
            duration = ?self.duration,
        )
    }
}

/// A process failed validation and was not run.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct RunRejected<'a> {
    pub process: &'a str,
    pub error_count: usize,
}

impl Display for RunRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Process '{}' rejected: {} validation errors",
            self.process, self.error_count
        )
    }
}

impl StructuredLog for RunRejected<'_> {
    fn log(&self) {
        tracing::error!(
            process = self.process,
            error_count = self.error_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "run_rejected",
            span_name = name,
            process = self.process,
            error_count = self.error_count,
        )
    }
}

/// A run could not continue past its beginning, or its starting chain failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct CriticalFailure<'a> {
    pub process: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for CriticalFailure<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Process '{}' critical failure: {}", self.process, self.error)
    }
}

impl StructuredLog for CriticalFailure<'_> {
    fn log(&self) {
        tracing::error!(
            process = self.process,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "critical_failure",
            span_name = name,
            process = self.process,
            error = %self.error,
        )
    }
}

/// An error was appended to the run's error list.
///
/// # Log Level
/// `warn!` - The failing branch stops, siblings continue
pub struct ErrorRecorded<'a> {
    pub source_id: &'a str,
    pub kind: ErrorKind,
    pub error: &'a dyn std::error::Error,
}

impl Display for ErrorRecorded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Recorded {} error for '{}': {}",
            self.kind, self.source_id, self.error
        )
    }
}

impl StructuredLog for ErrorRecorded<'_> {
    fn log(&self) {
        tracing::warn!(
            source_id = self.source_id,
            kind = %self.kind,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "error_recorded",
            span_name = name,
            source_id = self.source_id,
            kind = %self.kind,
        )
    }
}

/// The run ended while aggregators were still waiting for inputs.
///
/// # Log Level
/// `warn!` - Completed with pending joins
pub struct PendingJoinsRemaining<'a> {
    pub process: &'a str,
    pub node_ids: &'a [String],
}

impl Display for PendingJoinsRemaining<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Process '{}' completed with pending joins: {}",
            self.process,
            self.node_ids.join(", ")
        )
    }
}

impl StructuredLog for PendingJoinsRemaining<'_> {
    fn log(&self) {
        tracing::warn!(
            process = self.process,
            pending = ?self.node_ids,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "pending_joins",
            span_name = name,
            process = self.process,
            pending = ?self.node_ids,
        )
    }
}
