// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Run-scoped mutable state.
//!
//! One [`ExecutionState`] exists per run and is shared between the tasks of
//! that run through an `Arc`. Each collection sits behind its own
//! `tokio::sync::Mutex`. Locks are taken one at a time, with two fixed
//! exceptions: the scheduler reads `phase_results` while holding `active`,
//! and the join table holds its own lock while the aggregator borrows
//! `context`. Nothing ever locks in the opposite order.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use tokio::sync::Mutex;
use tokio_util::task::TaskTracker;

use crate::engine::join::JoinTable;
use crate::errors::{ErrorKind, ExecutionError, ExecutionResult, RecordedError};
use crate::events::{Event, EventDispatcher};
use crate::graph::{AggregatorNode, Context, JoinPolicy, Output, Process};
use crate::observability::messages::engine::ErrorRecorded;
use crate::observability::messages::transition::PathTerminated;
use crate::observability::messages::StructuredLog;

/// Handle to a scheduled node's eventual output, shared by every caller that
/// scheduled the same execution.
pub(crate) type NodeFuture = Shared<BoxFuture<'static, ExecutionResult<Output>>>;

pub(crate) struct ExecutionState {
    pub(crate) process: Arc<Process>,
    pub(crate) context: Mutex<Context>,
    pub(crate) phase_results: Mutex<HashMap<String, Output>>,
    pub(crate) results: Mutex<HashMap<String, Output>>,
    pub(crate) active: Mutex<HashMap<String, NodeFuture>>,
    pub(crate) joins: JoinTable,
    pub(crate) errors: Mutex<Vec<RecordedError>>,
    pub(crate) events: EventDispatcher,
    pub(crate) tracker: TaskTracker,
    join_policy: JoinPolicy,
}

impl ExecutionState {
    pub(crate) fn new(
        process: Arc<Process>,
        context: Context,
        events: EventDispatcher,
        join_policy: JoinPolicy,
    ) -> Self {
        Self {
            process,
            context: Mutex::new(context),
            phase_results: Mutex::new(HashMap::new()),
            results: Mutex::new(HashMap::new()),
            active: Mutex::new(HashMap::new()),
            joins: JoinTable::default(),
            errors: Mutex::new(Vec::new()),
            events,
            tracker: TaskTracker::new(),
            join_policy,
        }
    }

    /// Effective join policy for an aggregator node.
    pub(crate) fn join_policy_for(&self, node: &AggregatorNode) -> JoinPolicy {
        node.join_policy.unwrap_or(self.join_policy)
    }

    pub(crate) async fn emit<F>(&self, build: F)
    where
        F: FnOnce() -> Event,
    {
        self.events.emit(build).await;
    }

    /// Emit an event built from a snapshot of the run context.
    ///
    /// The snapshot is taken and the lock released before observers run.
    pub(crate) async fn emit_with_context<F>(&self, build: F)
    where
        F: FnOnce(Context) -> Event,
    {
        if self.events.is_empty() {
            return;
        }
        let snapshot = self.context.lock().await.clone();
        self.events.dispatch(&build(snapshot)).await;
    }

    pub(crate) async fn record_error(&self, source_id: &str, kind: ErrorKind, error: ExecutionError) {
        ErrorRecorded {
            source_id,
            kind,
            error: &error,
        }
        .log();
        self.errors.lock().await.push(RecordedError {
            source_id: source_id.to_string(),
            kind,
            error,
        });
    }

    /// Record a node's output. The first output stored for an id wins.
    pub(crate) async fn store_phase_result(&self, node_id: &str, output: &Output) {
        self.phase_results
            .lock()
            .await
            .entry(node_id.to_string())
            .or_insert_with(|| output.clone());
    }

    pub(crate) async fn record_result(&self, key: &str, output: &Output, implicit: bool) {
        PathTerminated {
            result_key: key,
            implicit,
        }
        .log();
        self.results
            .lock()
            .await
            .insert(key.to_string(), output.clone());
    }
}
