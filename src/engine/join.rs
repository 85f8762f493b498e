// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fan-in barrier for aggregator nodes.
//!
//! Every input reaching an aggregator goes through [`JoinTable::arrive`],
//! which runs under the table's lock so that looking up the node's barrier,
//! calling `aggregate` and then releasing or registering the barrier is one
//! atomic step for the run. For each aggregator id there is at most one open
//! barrier. The arrival that makes the aggregator ready releases it; that
//! arrival alone continues past the node, while the parked arrivals only
//! observe the released output.
//!
//! Barriers are `tokio::sync::watch` channels holding `None` until release.
//! Waiting on a barrier is never a tracked task, so a join that never becomes
//! ready cannot keep a run from finishing. When the run ends, open barriers
//! are reported and then abandoned, which wakes any remaining waiter with
//! [`ExecutionError::JoinAbandoned`].

use std::collections::HashMap;

use tokio::sync::{watch, Mutex};

use crate::engine::state::ExecutionState;
use crate::errors::{ExecutionError, ExecutionResult};
use crate::events::{Event, EventCategory, Stage};
use crate::graph::{AggregatorNode, Context, Input, JoinPolicy, Output};
use crate::observability::messages::node::{AggregatorDeferred, AggregatorReady, AggregatorRetired};
use crate::observability::messages::StructuredLog;
use crate::traits::Aggregation;

pub(crate) enum JoinOutcome {
    /// This arrival made the aggregator ready and owns the continuation.
    Ready(Output),
    /// Not ready yet; the arrival waits on the shared barrier.
    Pending(Barrier),
    /// The aggregator already fired and does not re-arm.
    Retired(Output),
}

/// A parked arrival's view of an aggregator's barrier.
pub(crate) struct Barrier {
    node_id: String,
    receiver: watch::Receiver<Option<Output>>,
}

impl Barrier {
    pub(crate) async fn wait(mut self) -> ExecutionResult<Output> {
        let released = match self.receiver.wait_for(Option::is_some).await {
            Ok(value) => (*value).clone(),
            Err(_) => None,
        };
        released.ok_or(ExecutionError::JoinAbandoned {
            node_id: self.node_id,
        })
    }
}

#[derive(Default)]
struct JoinSlots {
    pending: HashMap<String, watch::Sender<Option<Output>>>,
    fired: HashMap<String, Output>,
}

#[derive(Default)]
pub(crate) struct JoinTable {
    slots: Mutex<JoinSlots>,
}

impl JoinTable {
    /// Feed one input to an aggregator and settle its barrier.
    pub(crate) async fn arrive(
        &self,
        node: &AggregatorNode,
        policy: JoinPolicy,
        input: Input,
        context: &Mutex<Context>,
    ) -> ExecutionResult<JoinOutcome> {
        let mut slots = self.slots.lock().await;

        if policy == JoinPolicy::Once {
            if let Some(output) = slots.fired.get(&node.id) {
                AggregatorRetired { node_id: &node.id }.log();
                return Ok(JoinOutcome::Retired(output.clone()));
            }
        }

        let has_barrier = slots.pending.contains_key(&node.id);

        let aggregation = {
            let mut context = context.lock().await;
            node.aggregator.aggregate(input, &mut context).await
        }
        .map_err(|error| ExecutionError::AggregatorFailed {
            node_id: node.id.clone(),
            message: ExecutionError::describe(&error),
        })?;

        let outcome = match aggregation {
            Aggregation::Ready(output) => {
                if let Some(sender) = slots.pending.remove(&node.id) {
                    sender.send_replace(Some(output.clone()));
                }
                AggregatorReady {
                    node_id: &node.id,
                    released_barrier: has_barrier,
                }
                .log();
                slots.fired.insert(node.id.clone(), output.clone());
                JoinOutcome::Ready(output)
            }
            Aggregation::NotYetReady => {
                AggregatorDeferred {
                    node_id: &node.id,
                    joined_existing: has_barrier,
                }
                .log();
                let sender = slots
                    .pending
                    .entry(node.id.clone())
                    .or_insert_with(|| watch::channel(None).0);
                JoinOutcome::Pending(Barrier {
                    node_id: node.id.clone(),
                    receiver: sender.subscribe(),
                })
            }
        };

        Ok(outcome)
    }

    pub(crate) async fn is_pending(&self, node_id: &str) -> bool {
        self.slots.lock().await.pending.contains_key(node_id)
    }

    /// Ids of aggregators whose barrier is still open, sorted.
    pub(crate) async fn pending_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.slots.lock().await.pending.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Drop every open barrier, waking its waiters with `JoinAbandoned`.
    pub(crate) async fn abandon_all(&self) {
        self.slots.lock().await.pending.clear();
    }
}

/// Run an aggregator node for one input, emitting its lifecycle events.
pub(crate) async fn run_aggregator(
    state: &ExecutionState,
    node: &AggregatorNode,
    input: Input,
) -> ExecutionResult<JoinOutcome> {
    state
        .emit(|| Event::new(EventCategory::Aggregator, &node.id, Stage::Start).with_input(&input))
        .await;

    let policy = state.join_policy_for(node);
    let outcome = state
        .joins
        .arrive(node, policy, input, &state.context)
        .await?;

    match &outcome {
        JoinOutcome::Ready(output) => {
            state
                .emit(|| {
                    Event::new(EventCategory::Aggregator, &node.id, Stage::Aggregate)
                        .with_output(output)
                        .with_detail("ready")
                })
                .await;
            state
                .emit(|| Event::new(EventCategory::Aggregator, &node.id, Stage::Ready).with_output(output))
                .await;
        }
        JoinOutcome::Pending(_) => {
            state
                .emit(|| {
                    Event::new(EventCategory::Aggregator, &node.id, Stage::Aggregate)
                        .with_detail("not_yet_ready")
                })
                .await;
            state
                .emit(|| Event::new(EventCategory::Aggregator, &node.id, Stage::Defer))
                .await;
        }
        JoinOutcome::Retired(_) => {}
    }

    Ok(outcome)
}
