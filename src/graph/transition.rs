// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Transitions connect nodes and end paths.
//!
//! A node's routing is a [`Next`]: exactly one termination, a list of
//! connections, or a list of decisions. Because it is a sum type, mixed
//! connection/decision lists cannot be expressed. Empty lists are rejected by
//! validation but may still be produced at run time by a decision, in which
//! case the path terminates implicitly under the decision's id.

use std::fmt;
use std::sync::Arc;

use crate::graph::{Context, Input, Output};
use crate::traits::{
    Begin, Decide, FnBegin, FnDecide, FnTerminate, FnTransform, Terminate, Transform,
};

/// Static edge to a named node.
#[derive(Clone)]
pub struct Connection {
    pub id: String,
    pub target_node_id: String,
    pub transform: Option<Arc<dyn Transform>>,
}

impl Connection {
    pub fn new(id: impl Into<String>, target_node_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            target_node_id: target_node_id.into(),
            transform: None,
        }
    }

    pub fn with_transform(mut self, transform: impl Transform + 'static) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn with_transform_fn<F>(self, transform: F) -> Self
    where
        F: Fn(&Output, &mut Context) -> anyhow::Result<Input> + Send + Sync + 'static,
    {
        self.with_transform(FnTransform::new(transform))
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("target_node_id", &self.target_node_id)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// Edge whose destination is computed from the output at run time.
#[derive(Clone)]
pub struct Decision {
    pub id: String,
    pub decide: Arc<dyn Decide>,
}

impl Decision {
    pub fn new(id: impl Into<String>, decide: impl Decide + 'static) -> Self {
        Self {
            id: id.into(),
            decide: Arc::new(decide),
        }
    }

    pub fn from_fn<F>(id: impl Into<String>, decide: F) -> Self
    where
        F: Fn(&Output, &mut Context) -> anyhow::Result<DecisionOutcome> + Send + Sync + 'static,
    {
        Self::new(id, FnDecide::new(decide))
    }
}

impl fmt::Debug for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decision").field("id", &self.id).finish()
    }
}

/// Sink that records the output reaching it under its own id.
#[derive(Clone)]
pub struct Termination {
    pub id: String,
    pub terminate: Option<Arc<dyn Terminate>>,
}

impl Termination {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            terminate: None,
        }
    }

    pub fn with_terminate(mut self, terminate: impl Terminate + 'static) -> Self {
        self.terminate = Some(Arc::new(terminate));
        self
    }

    pub fn with_terminate_fn<F>(self, terminate: F) -> Self
    where
        F: Fn(&Output, &mut Context) -> anyhow::Result<Output> + Send + Sync + 'static,
    {
        self.with_terminate(FnTerminate::new(terminate))
    }
}

impl fmt::Debug for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Termination")
            .field("id", &self.id)
            .field("terminate", &self.terminate.is_some())
            .finish()
    }
}

/// Entry adapter of a run: turns the caller's input into the first node's input.
#[derive(Clone)]
pub struct Beginning {
    pub id: String,
    pub target_node_id: String,
    pub begin: Option<Arc<dyn Begin>>,
}

impl Beginning {
    pub fn new(id: impl Into<String>, target_node_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            target_node_id: target_node_id.into(),
            begin: None,
        }
    }

    pub fn with_begin(mut self, begin: impl Begin + 'static) -> Self {
        self.begin = Some(Arc::new(begin));
        self
    }

    pub fn with_begin_fn<F>(self, begin: F) -> Self
    where
        F: Fn(Input, &mut Context) -> anyhow::Result<Input> + Send + Sync + 'static,
    {
        self.with_begin(FnBegin::new(begin))
    }
}

impl fmt::Debug for Beginning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Beginning")
            .field("id", &self.id)
            .field("target_node_id", &self.target_node_id)
            .field("begin", &self.begin.is_some())
            .finish()
    }
}

/// Static routing attached to a node.
#[derive(Debug, Clone)]
pub enum Next {
    Termination(Termination),
    Connections(Vec<Connection>),
    Decisions(Vec<Decision>),
}

impl Next {
    /// Ids of the transitions directly under this routing, in declaration order.
    pub fn transition_ids(&self) -> Vec<&str> {
        match self {
            Next::Termination(termination) => vec![termination.id.as_str()],
            Next::Connections(connections) => connections.iter().map(|c| c.id.as_str()).collect(),
            Next::Decisions(decisions) => decisions.iter().map(|d| d.id.as_str()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Next::Termination(_) => false,
            Next::Connections(connections) => connections.is_empty(),
            Next::Decisions(decisions) => decisions.is_empty(),
        }
    }
}

impl From<Termination> for Next {
    fn from(termination: Termination) -> Self {
        Next::Termination(termination)
    }
}

impl From<Connection> for Next {
    fn from(connection: Connection) -> Self {
        Next::Connections(vec![connection])
    }
}

impl From<Vec<Connection>> for Next {
    fn from(connections: Vec<Connection>) -> Self {
        Next::Connections(connections)
    }
}

impl From<Decision> for Next {
    fn from(decision: Decision) -> Self {
        Next::Decisions(vec![decision])
    }
}

impl From<Vec<Decision>> for Next {
    fn from(decisions: Vec<Decision>) -> Self {
        Next::Decisions(decisions)
    }
}

/// Route chosen by a decision for one output.
///
/// An empty connection list ends the path under the decision's id.
#[derive(Debug, Clone)]
pub enum DecisionOutcome {
    Termination(Termination),
    Connections(Vec<Connection>),
}

impl DecisionOutcome {
    pub fn terminate(id: impl Into<String>) -> Self {
        DecisionOutcome::Termination(Termination::new(id))
    }

    pub fn connect(connections: impl IntoIterator<Item = Connection>) -> Self {
        DecisionOutcome::Connections(connections.into_iter().collect())
    }

    pub fn stop() -> Self {
        DecisionOutcome::Connections(Vec::new())
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            DecisionOutcome::Termination(termination) => {
                format!("termination '{}'", termination.id)
            }
            DecisionOutcome::Connections(connections) if connections.is_empty() => {
                "no connections".to_string()
            }
            DecisionOutcome::Connections(connections) => {
                let targets: Vec<&str> = connections
                    .iter()
                    .map(|c| c.target_node_id.as_str())
                    .collect();
                format!("connections to [{}]", targets.join(", "))
            }
        }
    }
}

impl From<Termination> for DecisionOutcome {
    fn from(termination: Termination) -> Self {
        DecisionOutcome::Termination(termination)
    }
}

impl From<Vec<Connection>> for DecisionOutcome {
    fn from(connections: Vec<Connection>) -> Self {
        DecisionOutcome::Connections(connections)
    }
}
