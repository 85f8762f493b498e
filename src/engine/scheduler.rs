// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Node scheduling with memoization and in-flight deduplication.
//!
//! [`schedule_node`] is the only way a node gets executed. It decides, under
//! the run's `active` lock, whether the request can be answered without new
//! work:
//!
//! 1. A node that already produced output in this run returns that output.
//!    This is what makes cyclic graphs terminate. Aggregators using
//!    [`JoinPolicy::Rearm`] skip this step so they can fire again.
//! 2. A phase node that is currently running returns the running execution's
//!    shared future. Aggregators never take this shortcut: every arrival has
//!    to reach the join logic because readiness depends on accumulated state.
//!
//! Otherwise the node body is spawned on the run's task tracker and its
//! shared future is registered in `active` before the lock is released, so a
//! concurrent caller always sees it.
//!
//! Node bodies never await barriers. An aggregator arrival that is not ready
//! finishes its task immediately and leaves a barrier wait in its shared
//! future, which only runs if somebody polls it. The run is therefore
//! complete as soon as the tracker is empty.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use tracing::Instrument;

use crate::engine::join::{run_aggregator, Barrier, JoinOutcome};
use crate::engine::phase::run_phase;
use crate::engine::resolver::resolve_next;
use crate::engine::state::{ExecutionState, NodeFuture};
use crate::errors::{ErrorKind, ExecutionError, ExecutionResult};
use crate::events::{Event, EventCategory, Stage};
use crate::graph::{Input, JoinPolicy, Node, Output};
use crate::observability::messages::node::{
    NodeCacheHit, NodeCompleted, NodeDeduplicated, NodeFailed, NodeStarted,
};
use crate::observability::messages::StructuredLog;

/// What a node task ended with.
pub(crate) enum NodeOutcome {
    /// The node produced output and its routing was handled.
    Completed(Output),
    /// An aggregator arrival parked on the node's barrier.
    Deferred(Barrier),
    /// An aggregator arrival came after the node already fired.
    Retired(Output),
}

/// Schedule `node_id` with `input` and return a handle to its output.
///
/// The node runs whether or not the handle is awaited.
pub(crate) async fn schedule_node(
    state: &Arc<ExecutionState>,
    node_id: &str,
    input: Input,
) -> NodeFuture {
    let Some(node) = state.process.node(node_id) else {
        let error = ExecutionError::NodeNotFound {
            node_id: node_id.to_string(),
        };
        state
            .record_error(node_id, ErrorKind::Node, error.clone())
            .await;
        return settled(Err(error));
    };

    let mut active = state.active.lock().await;

    let memoized = match node {
        Node::Phase(_) => true,
        Node::Aggregator(aggregator) => state.join_policy_for(aggregator) == JoinPolicy::Once,
    };
    if memoized {
        if let Some(output) = state.phase_results.lock().await.get(node_id) {
            NodeCacheHit { node_id }.log();
            return settled(Ok(output.clone()));
        }
    }

    if !node.is_aggregator() {
        if let Some(running) = active.get(node_id) {
            NodeDeduplicated { node_id }.log();
            return running.clone();
        }
    }

    let started = NodeStarted {
        node_id,
        kind: node.kind(),
    };
    started.log();
    let task = run_node(Arc::clone(state), node_id.to_string(), input)
        .instrument(started.span("schedule_node"));
    let handle = state.tracker.spawn(task);

    let owner = node_id.to_string();
    let execution = async move {
        match handle.await {
            Ok(Ok(NodeOutcome::Completed(output))) | Ok(Ok(NodeOutcome::Retired(output))) => {
                Ok(output)
            }
            Ok(Ok(NodeOutcome::Deferred(barrier))) => barrier.wait().await,
            Ok(Err(error)) => Err(error),
            Err(join_error) => Err(ExecutionError::TaskFailed {
                node_id: owner,
                message: join_error.to_string(),
            }),
        }
    }
    .boxed()
    .shared();

    active.insert(node_id.to_string(), execution.clone());
    execution
}

fn settled(result: ExecutionResult<Output>) -> NodeFuture {
    future::ready(result).boxed().shared()
}

/// Body of a node task: run the node, record any failure, then leave `active`.
///
/// Returns a boxed future so the scheduler → node → resolver → scheduler
/// cycle has a nameable type.
fn run_node(
    state: Arc<ExecutionState>,
    node_id: String,
    input: Input,
) -> BoxFuture<'static, ExecutionResult<NodeOutcome>> {
    async move {
        let outcome = match AssertUnwindSafe(drive_node(&state, &node_id, input))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(panic) => Err(ExecutionError::TaskFailed {
                node_id: node_id.clone(),
                message: panic_message(panic.as_ref()),
            }),
        };

        if let Err(error) = &outcome {
            NodeFailed {
                node_id: &node_id,
                error,
            }
            .log();
            state
                .record_error(&node_id, ErrorKind::Node, error.clone())
                .await;
        }

        // a parked aggregator stays visible until its barrier is released
        if !state.joins.is_pending(&node_id).await {
            state.active.lock().await.remove(&node_id);
        }

        outcome
    }
    .boxed()
}

async fn drive_node(
    state: &Arc<ExecutionState>,
    node_id: &str,
    input: Input,
) -> ExecutionResult<NodeOutcome> {
    let node = state
        .process
        .node(node_id)
        .ok_or_else(|| ExecutionError::NodeNotFound {
            node_id: node_id.to_string(),
        })?;

    state
        .emit(|| {
            Event::new(EventCategory::Node, node_id, Stage::Start)
                .with_input(&input)
                .with_detail(node.kind())
        })
        .await;

    let output = match node {
        Node::Phase(phase_node) => run_phase(state, phase_node, input).await?,
        Node::Aggregator(aggregator_node) => {
            match run_aggregator(state, aggregator_node, input).await? {
                JoinOutcome::Ready(output) => output,
                JoinOutcome::Pending(barrier) => return Ok(NodeOutcome::Deferred(barrier)),
                JoinOutcome::Retired(output) => return Ok(NodeOutcome::Retired(output)),
            }
        }
    };

    state.store_phase_result(node_id, &output).await;

    match node.next() {
        Some(next) => resolve_next(state, &output, node_id, next).await,
        None => state.record_result(node_id, &output, true).await,
    }

    state
        .emit(|| Event::new(EventCategory::Node, node_id, Stage::End).with_output(&output))
        .await;
    NodeCompleted { node_id }.log();

    Ok(NodeOutcome::Completed(output))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "node task panicked".to_string()
    }
}
