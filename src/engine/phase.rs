// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::state::ExecutionState;
use crate::errors::{ExecutionError, ExecutionResult};
use crate::events::{Event, EventCategory, Stage};
use crate::graph::{Input, Output, PhaseNode};

/// Run a phase node for one input: prepare, verify, execute, process.
///
/// `prepare` and `process` hold the run context for their whole call;
/// `verify` and `execute` run without it.
pub(crate) async fn run_phase(
    state: &ExecutionState,
    node: &PhaseNode,
    input: Input,
) -> ExecutionResult<Output> {
    let input = {
        let mut context = state.context.lock().await;
        node.phase.prepare(input, &mut context).await
    }
    .map_err(|error| ExecutionError::HookFailed {
        node_id: node.id.clone(),
        hook: "prepare",
        message: ExecutionError::describe(&error),
    })?;
    state
        .emit(|| Event::new(EventCategory::Node, &node.id, Stage::Prepared).with_input(&input))
        .await;

    state
        .emit(|| Event::new(EventCategory::Phase, &node.id, Stage::Start).with_input(&input))
        .await;

    let verification = node.phase.verify(&input).await;
    if !verification.verified {
        return Err(ExecutionError::VerificationFailed {
            node_id: node.id.clone(),
            messages: verification.messages,
        });
    }

    let output = node
        .phase
        .execute(input.clone())
        .await
        .map_err(|error| ExecutionError::PhaseFailed {
            node_id: node.id.clone(),
            message: ExecutionError::describe(&error),
        })?;
    state
        .emit(|| {
            Event::new(EventCategory::Phase, &node.id, Stage::Execute)
                .with_input(&input)
                .with_output(&output)
        })
        .await;

    let output = {
        let mut context = state.context.lock().await;
        node.phase.process(output, &mut context).await
    }
    .map_err(|error| ExecutionError::HookFailed {
        node_id: node.id.clone(),
        hook: "process",
        message: ExecutionError::describe(&error),
    })?;
    state
        .emit(|| Event::new(EventCategory::Node, &node.id, Stage::Processed).with_output(&output))
        .await;

    Ok(output)
}
