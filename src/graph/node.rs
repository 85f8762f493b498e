// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::Deserialize;

use crate::graph::{Context, Input, Next, Output};
use crate::traits::{Aggregation, Aggregator, FnAggregator, FnPhase, Phase};

/// What happens when an aggregator is fed again after it has released its join.
///
/// # Variants
/// * `Once` - the first `Ready` ends the aggregator's life for the run; later
///   arrivals resolve to the released output without calling `aggregate`.
/// * `Rearm` - later arrivals call `aggregate` again and may release again,
///   each release running its own continuation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinPolicy {
    #[default]
    Once,
    Rearm,
}

/// Node wrapping a [`Phase`].
#[derive(Clone)]
pub struct PhaseNode {
    pub id: String,
    pub phase: Arc<dyn Phase>,
    pub next: Option<Next>,
}

impl PhaseNode {
    pub fn new(id: impl Into<String>, phase: impl Phase + 'static) -> Self {
        Self::from_arc(id, Arc::new(phase))
    }

    pub fn from_arc(id: impl Into<String>, phase: Arc<dyn Phase>) -> Self {
        Self {
            id: id.into(),
            phase,
            next: None,
        }
    }

    /// Node running an async closure as its phase; the phase is named after the node.
    pub fn from_fn<F, Fut>(id: impl Into<String>, execute: F) -> Self
    where
        F: Fn(Input) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Output>> + Send + 'static,
    {
        let id = id.into();
        let phase = FnPhase::new(id.clone(), execute);
        Self::new(id, phase)
    }

    pub fn with_next(mut self, next: impl Into<Next>) -> Self {
        self.next = Some(next.into());
        self
    }
}

/// Node wrapping an [`Aggregator`].
#[derive(Clone)]
pub struct AggregatorNode {
    pub id: String,
    pub aggregator: Arc<dyn Aggregator>,
    pub next: Option<Next>,
    /// Overrides the engine-wide join policy for this node.
    pub join_policy: Option<JoinPolicy>,
}

impl AggregatorNode {
    pub fn new(id: impl Into<String>, aggregator: impl Aggregator + 'static) -> Self {
        Self::from_arc(id, Arc::new(aggregator))
    }

    pub fn from_arc(id: impl Into<String>, aggregator: Arc<dyn Aggregator>) -> Self {
        Self {
            id: id.into(),
            aggregator,
            next: None,
            join_policy: None,
        }
    }

    pub fn from_fn<F>(id: impl Into<String>, aggregate: F) -> Self
    where
        F: Fn(Input, &mut Context) -> anyhow::Result<Aggregation> + Send + Sync + 'static,
    {
        let id = id.into();
        let aggregator = FnAggregator::new(id.clone(), aggregate);
        Self::new(id, aggregator)
    }

    pub fn with_next(mut self, next: impl Into<Next>) -> Self {
        self.next = Some(next.into());
        self
    }

    pub fn with_join_policy(mut self, policy: JoinPolicy) -> Self {
        self.join_policy = Some(policy);
        self
    }
}

/// A vertex of a process graph.
#[derive(Clone)]
pub enum Node {
    Phase(PhaseNode),
    Aggregator(AggregatorNode),
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Node::Phase(node) => &node.id,
            Node::Aggregator(node) => &node.id,
        }
    }

    pub fn next(&self) -> Option<&Next> {
        match self {
            Node::Phase(node) => node.next.as_ref(),
            Node::Aggregator(node) => node.next.as_ref(),
        }
    }

    pub fn is_aggregator(&self) -> bool {
        matches!(self, Node::Aggregator(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Phase(_) => "phase",
            Node::Aggregator(_) => "aggregator",
        }
    }

    /// Name of the wrapped phase or aggregator.
    pub fn unit_name(&self) -> &str {
        match self {
            Node::Phase(node) => node.phase.name(),
            Node::Aggregator(node) => node.aggregator.name(),
        }
    }
}

impl From<PhaseNode> for Node {
    fn from(node: PhaseNode) -> Self {
        Node::Phase(node)
    }
}

impl From<AggregatorNode> for Node {
    fn from(node: AggregatorNode) -> Self {
        Node::Aggregator(node)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Node");
        debug
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("unit", &self.unit_name())
            .field("next", &self.next());
        if let Node::Aggregator(node) = self {
            debug.field("join_policy", &node.join_policy);
        }
        debug.finish()
    }
}
