// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Routing of a node's output once the node has completed.
//!
//! * Decisions are evaluated concurrently and all of them finish before the
//!   node counts as done. Each decision's outcome is routed with the
//!   decision's id as the reporting id.
//! * Connections are walked in order. Each target is scheduled without
//!   waiting for it, so fan-out branches run concurrently.
//! * A termination records the output that reached it.
//! * An empty connection list ends the path under the reporting id.
//!
//! A failing transform, decision or termination hook is recorded and only
//! its own path is affected.

use std::sync::Arc;

use futures::future::join_all;

use crate::engine::scheduler::schedule_node;
use crate::engine::state::ExecutionState;
use crate::errors::{ErrorKind, ExecutionError};
use crate::events::{Event, EventCategory, Stage};
use crate::graph::{Connection, Decision, DecisionOutcome, Next, Output, Termination};
use crate::observability::messages::transition::{ConnectionFollowed, DecisionRouted};
use crate::observability::messages::StructuredLog;

pub(crate) async fn resolve_next(
    state: &Arc<ExecutionState>,
    output: &Output,
    node_id: &str,
    next: &Next,
) {
    match next {
        Next::Decisions(decisions) => {
            join_all(
                decisions
                    .iter()
                    .map(|decision| apply_decision(state, output, node_id, decision)),
            )
            .await;
        }
        Next::Connections(connections) => {
            follow_connections(state, output, node_id, node_id, connections).await
        }
        Next::Termination(termination) => terminate(state, output, node_id, termination).await,
    }
}

async fn apply_decision(
    state: &Arc<ExecutionState>,
    output: &Output,
    node_id: &str,
    decision: &Decision,
) {
    state
        .emit(|| {
            Event::new(EventCategory::Decision, node_id, Stage::Start)
                .with_transition(&decision.id)
                .with_output(output)
        })
        .await;

    let outcome = {
        let mut context = state.context.lock().await;
        decision.decide.decide(output, &mut context).await
    };
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(error) => {
            let error = ExecutionError::DecisionFailed {
                decision_id: decision.id.clone(),
                message: ExecutionError::describe(&error),
            };
            state
                .record_error(&decision.id, ErrorKind::Decision, error)
                .await;
            return;
        }
    };

    let route = outcome.describe();
    DecisionRouted {
        node_id,
        decision_id: &decision.id,
        route: &route,
    }
    .log();
    state
        .emit(|| {
            Event::new(EventCategory::Decision, node_id, Stage::Decide)
                .with_transition(&decision.id)
                .with_output(output)
                .with_detail(route.as_str())
        })
        .await;

    match &outcome {
        DecisionOutcome::Termination(termination) => {
            terminate(state, output, node_id, termination).await
        }
        DecisionOutcome::Connections(connections) => {
            follow_connections(state, output, node_id, &decision.id, connections).await
        }
    }

    state
        .emit(|| {
            Event::new(EventCategory::Decision, node_id, Stage::End).with_transition(&decision.id)
        })
        .await;
}

/// Schedule every connection's target in order.
///
/// `node_id` is the node whose output is routed; `reporting_id` keys the
/// implicit result when there is nothing to follow.
async fn follow_connections(
    state: &Arc<ExecutionState>,
    output: &Output,
    node_id: &str,
    reporting_id: &str,
    connections: &[Connection],
) {
    if connections.is_empty() {
        state.record_result(reporting_id, output, true).await;
        return;
    }

    for connection in connections {
        state
            .emit(|| {
                Event::new(EventCategory::Connection, node_id, Stage::Start)
                    .with_transition(&connection.id)
                    .with_input(output)
            })
            .await;

        let input = match &connection.transform {
            None => output.clone(),
            Some(transform) => {
                let transformed = {
                    let mut context = state.context.lock().await;
                    let mut scratch = context.clone();
                    let transformed = transform.transform(output, &mut scratch).await;
                    if transformed.is_ok() {
                        *context = scratch;
                    }
                    transformed
                };
                match transformed {
                    Ok(input) => {
                        state
                            .emit(|| {
                                Event::new(EventCategory::Connection, node_id, Stage::Transform)
                                    .with_transition(&connection.id)
                                    .with_input(&input)
                                    .with_output(output)
                            })
                            .await;
                        input
                    }
                    Err(error) => {
                        let error = ExecutionError::TransformFailed {
                            connection_id: connection.id.clone(),
                            target_node_id: connection.target_node_id.clone(),
                            message: ExecutionError::describe(&error),
                        };
                        state
                            .record_error(&connection.id, ErrorKind::Transform, error)
                            .await;
                        continue;
                    }
                }
            }
        };

        ConnectionFollowed {
            node_id,
            connection_id: &connection.id,
            target_node_id: &connection.target_node_id,
        }
        .log();
        // the target runs on its own task; its handle is not needed here
        let _ = schedule_node(state, &connection.target_node_id, input).await;

        state
            .emit(|| {
                Event::new(EventCategory::Connection, node_id, Stage::End)
                    .with_transition(&connection.id)
            })
            .await;
    }
}

async fn terminate(
    state: &Arc<ExecutionState>,
    output: &Output,
    node_id: &str,
    termination: &Termination,
) {
    state
        .emit(|| {
            Event::new(EventCategory::Termination, node_id, Stage::Start)
                .with_transition(&termination.id)
                .with_output(output)
        })
        .await;

    if let Some(hook) = &termination.terminate {
        let finalized = {
            let mut context = state.context.lock().await;
            hook.terminate(output, &mut context).await
        };
        match finalized {
            Ok(finalized) => {
                state
                    .emit(|| {
                        Event::new(EventCategory::Termination, node_id, Stage::Terminate)
                            .with_transition(&termination.id)
                            .with_input(output)
                            .with_output(&finalized)
                    })
                    .await;
            }
            Err(error) => {
                let error = ExecutionError::TerminationFailed {
                    termination_id: termination.id.clone(),
                    message: ExecutionError::describe(&error),
                };
                state
                    .record_error(&termination.id, ErrorKind::Termination, error)
                    .await;
            }
        }
    }

    state.record_result(&termination.id, output, false).await;
}
