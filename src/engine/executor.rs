// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Process driver: the entry point of a run.
//!
//! A run goes through these steps:
//!
//! 1. Validate the process and beginning; any defect rejects the run before
//!    a single node executes.
//! 2. Build fresh run state from the engine config and the caller's options.
//! 3. Run the beginning to compute the first input.
//! 4. Schedule the beginning's target and wait until every spawned node task
//!    (including fan-out branches nobody awaits) has finished.
//! 5. Record a critical error if the starting chain failed, report any join
//!    that never became ready, and hand back everything the run produced.
//!
//! Node, transform, decision and termination failures never fail the run;
//! they are returned in [`ProcessOutcome::errors`] next to the results of
//! the branches that succeeded.

use std::collections::HashMap;
use std::mem;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use serde_json::{Map, Value};
use tracing::Instrument;

use crate::config::EngineConfig;
use crate::engine::scheduler::schedule_node;
use crate::engine::state::ExecutionState;
use crate::errors::{ErrorKind, ExecutionError, ExecutionResult, RecordedError};
use crate::events::{Event, EventCategory, EventDispatcher, LoggingObserver, Stage};
use crate::graph::{validate_beginning, validate_process, Beginning, Context, Input, Output, Process};
use crate::observability::messages::engine::{
    CriticalFailure, PendingJoinsRemaining, RunCompleted, RunRejected, RunStarted,
};
use crate::observability::messages::StructuredLog;
use crate::traits::Observer;

/// Per-run inputs supplied by the caller.
pub struct ExecutionOptions {
    /// Input handed to the beginning. Defaults to an empty JSON object.
    pub input: Input,
    /// Initial context. Keys here override the engine's `initial_context`.
    pub context: Context,
    pub observers: Vec<Arc<dyn Observer>>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            input: Value::Object(Map::new()),
            context: Context::new(),
            observers: Vec::new(),
        }
    }
}

impl ExecutionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, input: Input) -> Self {
        self.input = input;
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutcome {
    /// Terminal outputs keyed by termination id, or by node/decision id for
    /// implicit terminations.
    pub results: HashMap<String, Output>,
    /// Output of every node that completed, keyed by node id.
    pub phase_results: HashMap<String, Output>,
    /// The run context after the last branch finished.
    pub context: Context,
    /// Every failure recorded during the run, in the order it happened.
    pub errors: Vec<RecordedError>,
    /// Aggregators still waiting for inputs when the run ended, sorted by id.
    pub pending_joins: Vec<String>,
}

impl ProcessOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.pending_joins.is_empty()
    }

    /// Errors recorded against one node or transition id.
    pub fn errors_for<'a>(&'a self, source_id: &'a str) -> impl Iterator<Item = &'a RecordedError> {
        self.errors
            .iter()
            .filter(move |recorded| recorded.source_id == source_id)
    }

    /// Split into `(results, phase_results, context)`.
    pub fn into_parts(self) -> (HashMap<String, Output>, HashMap<String, Output>, Context) {
        (self.results, self.phase_results, self.context)
    }
}

/// Runs processes with a fixed engine configuration.
///
/// The executor holds no run state; one instance can drive any number of
/// concurrent runs.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use phaseflow::engine::{ExecutionOptions, ProcessExecutor};
/// use phaseflow::graph::{Beginning, PhaseNode, Process, Termination};
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let process = Process::new("greeting").with_node(
///     PhaseNode::from_fn("greet", |input| async move {
///         let name = input["name"].as_str().unwrap_or("world").to_string();
///         anyhow::Ok(json!({ "greeting": format!("hello {}", name) }))
///     })
///     .with_next(Termination::new("done")),
/// );
///
/// let outcome = ProcessExecutor::default()
///     .execute(
///         Arc::new(process),
///         &Beginning::new("start", "greet"),
///         ExecutionOptions::new().with_input(json!({ "name": "ada" })),
///     )
///     .await?;
///
/// assert_eq!(outcome.results["done"], json!({ "greeting": "hello ada" }));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    config: EngineConfig,
}

impl ProcessExecutor {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.clone())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn execute(
        &self,
        process: Arc<Process>,
        beginning: &Beginning,
        options: ExecutionOptions,
    ) -> ExecutionResult<ProcessOutcome> {
        let mut errors = Vec::new();
        if let Err(process_errors) = validate_process(&process) {
            errors.extend(process_errors);
        }
        if let Err(beginning_errors) = validate_beginning(beginning, &process) {
            errors.extend(beginning_errors);
        }
        if !errors.is_empty() {
            RunRejected {
                process: process.name(),
                error_count: errors.len(),
            }
            .log();
            return Err(ExecutionError::InvalidProcess {
                process: process.name().to_string(),
                errors,
            });
        }

        let started = RunStarted {
            process: process.name(),
            node_count: process.len(),
            observer_count: options.observers.len(),
        };
        let span = started.span("execute_process");
        started.log();

        self.run(Arc::clone(&process), beginning, options)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        process: Arc<Process>,
        beginning: &Beginning,
        options: ExecutionOptions,
    ) -> ExecutionResult<ProcessOutcome> {
        let clock = Instant::now();
        let name = process.name().to_string();

        let mut context = self.config.initial_context.clone();
        context.extend(options.context);

        let mut events = EventDispatcher::new(options.observers);
        let logging = &self.config.event_logging;
        if logging.enabled {
            let mut observer = LoggingObserver::new(logging.level.into());
            if let Some(label) = &logging.label {
                observer = observer.with_label(label.as_str());
            }
            events.register(Arc::new(observer));
        }

        let state = Arc::new(ExecutionState::new(
            process,
            context,
            events,
            self.config.join_policy,
        ));

        let input = options.input;
        state
            .emit_with_context(|context| {
                Event::new(EventCategory::Process, &name, Stage::Start)
                    .with_input(&input)
                    .with_context(context)
            })
            .await;
        state
            .emit(|| {
                Event::new(EventCategory::Beginning, &beginning.id, Stage::Start)
                    .with_transition(&beginning.id)
                    .with_input(&input)
            })
            .await;

        let input = match &beginning.begin {
            None => input,
            Some(begin) => {
                let begun = {
                    let mut context = state.context.lock().await;
                    begin.begin(input, &mut context).await
                };
                match begun {
                    Ok(input) => input,
                    Err(error) => {
                        let error = ExecutionError::BeginningFailed {
                            beginning_id: beginning.id.clone(),
                            message: ExecutionError::describe(&error),
                        };
                        CriticalFailure {
                            process: &name,
                            error: &error,
                        }
                        .log();
                        return Err(error);
                    }
                }
            }
        };
        state
            .emit(|| {
                Event::new(EventCategory::Beginning, &beginning.id, Stage::Begin)
                    .with_transition(&beginning.id)
                    .with_output(&input)
            })
            .await;

        let start = schedule_node(&state, &beginning.target_node_id, input).await;

        // every fan-out branch is a tracked task, so this waits for all of them
        state.tracker.close();
        state.tracker.wait().await;

        if let Some(Err(error)) = start.now_or_never() {
            CriticalFailure {
                process: &name,
                error: &error,
            }
            .log();
            state
                .record_error(&beginning.target_node_id, ErrorKind::Critical, error)
                .await;
        }

        let pending_joins = state.joins.pending_ids().await;
        if !pending_joins.is_empty() {
            PendingJoinsRemaining {
                process: &name,
                node_ids: &pending_joins,
            }
            .log();
        }
        state.joins.abandon_all().await;

        state
            .emit_with_context(|context| {
                Event::new(EventCategory::Process, &name, Stage::End).with_context(context)
            })
            .await;

        state.active.lock().await.clear();
        let outcome = ProcessOutcome {
            results: mem::take(&mut *state.results.lock().await),
            phase_results: mem::take(&mut *state.phase_results.lock().await),
            context: mem::take(&mut *state.context.lock().await),
            errors: mem::take(&mut *state.errors.lock().await),
            pending_joins,
        };

        RunCompleted {
            process: &name,
            result_count: outcome.results.len(),
            error_count: outcome.errors.len(),
            duration: clock.elapsed(),
        }
        .log();

        Ok(outcome)
    }
}

/// Run a process with the default engine configuration.
pub async fn execute_process(
    process: Arc<Process>,
    beginning: &Beginning,
    options: ExecutionOptions,
) -> ExecutionResult<ProcessOutcome> {
    ProcessExecutor::default()
        .execute(process, beginning, options)
        .await
}
