// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for node scheduling and aggregator joins.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A node body was spawned.
///
/// # Log Level
/// `debug!` - Per-node lifecycle detail
///
/// # Example
/// ```
/// use phaseflow::observability::messages::node::NodeStarted;
/// use phaseflow::observability::messages::StructuredLog;
///
/// let msg = NodeStarted {
///     node_id: "double",
///     kind: "phase",
/// };
///
/// let span = msg.span("node");
/// let _entered = span.enter();
/// msg.log();
/// ```
pub struct NodeStarted<'a> {
    pub node_id: &'a str,
    pub kind: &'a str,
}

impl Display for NodeStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Running {} node '{}'", self.kind, self.node_id)
    }
}

impl StructuredLog for NodeStarted<'_> {
    fn log(&self) {
        tracing::debug!(node_id = self.node_id, kind = self.kind, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "node",
            span_name = name,
            node_id = self.node_id,
            kind = self.kind,
        )
    }
}

/// A node had already produced output in this run; the cached output was reused.
pub struct NodeCacheHit<'a> {
    pub node_id: &'a str,
}

impl Display for NodeCacheHit<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}' already completed, reusing its output", self.node_id)
    }
}

impl StructuredLog for NodeCacheHit<'_> {
    fn log(&self) {
        tracing::debug!(node_id = self.node_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("node_cache_hit", span_name = name, node_id = self.node_id)
    }
}

/// A node was scheduled while already running; the caller joins the running execution.
pub struct NodeDeduplicated<'a> {
    pub node_id: &'a str,
}

impl Display for NodeDeduplicated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}' is already running, joining it", self.node_id)
    }
}

impl StructuredLog for NodeDeduplicated<'_> {
    fn log(&self) {
        tracing::debug!(node_id = self.node_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("node_deduplicated", span_name = name, node_id = self.node_id)
    }
}

/// A node finished and its routing was handled.
pub struct NodeCompleted<'a> {
    pub node_id: &'a str,
}

impl Display for NodeCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}' completed", self.node_id)
    }
}

impl StructuredLog for NodeCompleted<'_> {
    fn log(&self) {
        tracing::debug!(node_id = self.node_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("node_completed", span_name = name, node_id = self.node_id)
    }
}

/// A node failed; its continuation is abandoned.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct NodeFailed<'a> {
    pub node_id: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for NodeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}' failed: {}", self.node_id, self.error)
    }
}

impl StructuredLog for NodeFailed<'_> {
    fn log(&self) {
        tracing::error!(node_id = self.node_id, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "node_failed",
            span_name = name,
            node_id = self.node_id,
            error = %self.error,
        )
    }
}

/// An aggregator is not ready yet; the arrival parks on the node's barrier.
pub struct AggregatorDeferred<'a> {
    pub node_id: &'a str,
    pub joined_existing: bool,
}

impl Display for AggregatorDeferred<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.joined_existing {
            write!(f, "Aggregator '{}' not ready, joining open barrier", self.node_id)
        } else {
            write!(f, "Aggregator '{}' not ready, opening barrier", self.node_id)
        }
    }
}

impl StructuredLog for AggregatorDeferred<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            joined_existing = self.joined_existing,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "aggregator_deferred",
            span_name = name,
            node_id = self.node_id,
            joined_existing = self.joined_existing,
        )
    }
}

/// An aggregator became ready and released its barrier.
pub struct AggregatorReady<'a> {
    pub node_id: &'a str,
    pub released_barrier: bool,
}

impl Display for AggregatorReady<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Aggregator '{}' ready", self.node_id)
    }
}

impl StructuredLog for AggregatorReady<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            released_barrier = self.released_barrier,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("aggregator_ready", span_name = name, node_id = self.node_id)
    }
}

/// An input reached an aggregator that already fired and does not re-arm.
pub struct AggregatorRetired<'a> {
    pub node_id: &'a str,
}

impl Display for AggregatorRetired<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Aggregator '{}' already fired, ignoring late input",
            self.node_id
        )
    }
}

impl StructuredLog for AggregatorRetired<'_> {
    fn log(&self) {
        tracing::debug!(node_id = self.node_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("aggregator_retired", span_name = name, node_id = self.node_id)
    }
}
