// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types raised while a process is running.
//!
//! [`ExecutionError`] is what a failing node, transition or hook produces.
//! Failures inside a running process are never thrown past the driver; they
//! are appended to the run's error list as [`RecordedError`] values and
//! handed back with the rest of the outcome.

use std::fmt;
use thiserror::Error;

use super::ValidationError;

/// Result alias for engine operations.
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// Everything that can go wrong while executing a process.
///
/// Callback failures arrive as `anyhow::Error`; only their rendered message is
/// kept so the error stays `Clone` and can be shared by every caller awaiting
/// the same node.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// The process definition failed static validation; nothing ran.
    #[error("Process '{process}' failed validation:\n{}", join_validation(.errors))]
    InvalidProcess {
        process: String,
        errors: Vec<ValidationError>,
    },

    /// A transition referenced a node id the process does not contain.
    #[error("Node '{node_id}' not found in process")]
    NodeNotFound { node_id: String },

    /// A phase rejected its input.
    #[error("Node '{node_id}' failed verification:\n{}", join_lines(.messages))]
    VerificationFailed {
        node_id: String,
        messages: Vec<String>,
    },

    /// A phase's `execute` returned an error.
    #[error("Phase '{node_id}' failed: {message}")]
    PhaseFailed { node_id: String, message: String },

    /// A phase's `prepare` or `process` hook returned an error.
    #[error("{hook} hook of phase '{node_id}' failed: {message}")]
    HookFailed {
        node_id: String,
        hook: &'static str,
        message: String,
    },

    /// An aggregator's `aggregate` returned an error.
    #[error("Aggregator '{node_id}' failed: {message}")]
    AggregatorFailed { node_id: String, message: String },

    /// A connection's transform returned an error; only that connection is skipped.
    #[error("Transform of connection '{connection_id}' to '{target_node_id}' failed: {message}")]
    TransformFailed {
        connection_id: String,
        target_node_id: String,
        message: String,
    },

    /// A decision's `decide` returned an error; only that decision's path is skipped.
    #[error("Decision '{decision_id}' failed: {message}")]
    DecisionFailed {
        decision_id: String,
        message: String,
    },

    /// A termination's `terminate` hook returned an error. The result is still recorded.
    #[error("Termination '{termination_id}' failed: {message}")]
    TerminationFailed {
        termination_id: String,
        message: String,
    },

    /// The beginning transition could not produce the first input.
    #[error("Beginning '{beginning_id}' failed: {message}")]
    BeginningFailed {
        beginning_id: String,
        message: String,
    },

    /// The run finished while an aggregator was still waiting for inputs.
    #[error("Aggregator '{node_id}' never became ready before the run ended")]
    JoinAbandoned { node_id: String },

    /// The task running a node panicked or was aborted.
    #[error("Task for node '{node_id}' failed: {message}")]
    TaskFailed { node_id: String, message: String },
}

impl ExecutionError {
    /// Render a callback error together with its context chain.
    pub fn describe(error: &anyhow::Error) -> String {
        format!("{:#}", error)
    }

    /// The id of the node or transition this error belongs to, if any.
    pub fn source_id(&self) -> Option<&str> {
        match self {
            ExecutionError::InvalidProcess { .. } => None,
            ExecutionError::NodeNotFound { node_id }
            | ExecutionError::VerificationFailed { node_id, .. }
            | ExecutionError::PhaseFailed { node_id, .. }
            | ExecutionError::HookFailed { node_id, .. }
            | ExecutionError::AggregatorFailed { node_id, .. }
            | ExecutionError::JoinAbandoned { node_id }
            | ExecutionError::TaskFailed { node_id, .. } => Some(node_id),
            ExecutionError::TransformFailed { connection_id, .. } => Some(connection_id),
            ExecutionError::DecisionFailed { decision_id, .. } => Some(decision_id),
            ExecutionError::TerminationFailed { termination_id, .. } => Some(termination_id),
            ExecutionError::BeginningFailed { beginning_id, .. } => Some(beginning_id),
        }
    }
}

fn join_lines(messages: &[String]) -> String {
    messages.join("\n")
}

fn join_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Where in the graph a recorded error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A phase or aggregator node failed.
    Node,
    /// A connection transform failed.
    Transform,
    /// A decision failed.
    Decision,
    /// A termination hook failed.
    Termination,
    /// The chain started from the beginning transition failed.
    Critical,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Node => "node",
            ErrorKind::Transform => "transform",
            ErrorKind::Decision => "decision",
            ErrorKind::Termination => "termination",
            ErrorKind::Critical => "critical",
        };
        f.write_str(label)
    }
}

/// One entry in a run's append-only error list.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedError {
    pub source_id: String,
    pub kind: ErrorKind,
    pub error: ExecutionError,
}

impl fmt::Display for RecordedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}] {}", self.kind, self.source_id, self.error)
    }
}
