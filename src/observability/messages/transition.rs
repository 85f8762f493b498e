// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for routing after a node completes.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A connection scheduled its target node.
pub struct ConnectionFollowed<'a> {
    pub node_id: &'a str,
    pub connection_id: &'a str,
    pub target_node_id: &'a str,
}

impl Display for ConnectionFollowed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' -> '{}' via connection '{}'",
            self.node_id, self.target_node_id, self.connection_id
        )
    }
}

impl StructuredLog for ConnectionFollowed<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            connection_id = self.connection_id,
            target_node_id = self.target_node_id,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "connection",
            span_name = name,
            connection_id = self.connection_id,
            target_node_id = self.target_node_id,
        )
    }
}

/// A decision picked a route.
///
/// # Example
/// ```
/// use phaseflow::observability::messages::transition::DecisionRouted;
///
/// let msg = DecisionRouted {
///     node_id: "double",
///     decision_id: "is-large",
///     route: "termination 'large'",
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Decision 'is-large' of 'double' routed to termination 'large'"
/// );
/// ```
pub struct DecisionRouted<'a> {
    pub node_id: &'a str,
    pub decision_id: &'a str,
    pub route: &'a str,
}

impl Display for DecisionRouted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Decision '{}' of '{}' routed to {}",
            self.decision_id, self.node_id, self.route
        )
    }
}

impl StructuredLog for DecisionRouted<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            decision_id = self.decision_id,
            route = self.route,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "decision",
            span_name = name,
            node_id = self.node_id,
            decision_id = self.decision_id,
        )
    }
}

/// A path ended and its output was recorded as a result.
pub struct PathTerminated<'a> {
    pub result_key: &'a str,
    pub implicit: bool,
}

impl Display for PathTerminated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.implicit {
            write!(f, "Path ended implicitly, result recorded as '{}'", self.result_key)
        } else {
            write!(f, "Termination '{}' recorded its result", self.result_key)
        }
    }
}

impl StructuredLog for PathTerminated<'_> {
    fn log(&self) {
        tracing::debug!(
            result_key = self.result_key,
            implicit = self.implicit,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "termination",
            span_name = name,
            result_key = self.result_key,
        )
    }
}
