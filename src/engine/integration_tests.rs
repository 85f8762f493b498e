// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::EngineConfig;
use crate::demos::{self, SumAggregator, DECISION_TERMINATION_ID};
use crate::engine::{execute_process, ExecutionOptions, ProcessExecutor, ProcessOutcome};
use crate::errors::{ErrorKind, ExecutionError, ValidationError};
use crate::events::{CollectingObserver, Event, EventCategory, Stage};
use crate::graph::{
    AggregatorNode, Beginning, Connection, Context, Decision, DecisionOutcome, Input, JoinPolicy,
    Output, PhaseNode, Process, Termination,
};
use crate::traits::{Aggregation, Observer, Phase, Verification};

/// Integration tests for the process executor using the reference processes
/// and purpose-built phases.
#[cfg(test)]
mod tests {
    use super::*;

    /// Phase that counts its executions and optionally sleeps before running.
    struct CountingPhase {
        name: String,
        calls: Arc<AtomicUsize>,
        delay: Duration,
        body: fn(&Input) -> anyhow::Result<Output>,
    }

    impl CountingPhase {
        fn new(name: &str, body: fn(&Input) -> anyhow::Result<Output>) -> Self {
            Self {
                name: name.to_string(),
                calls: Arc::new(AtomicUsize::new(0)),
                delay: Duration::ZERO,
                body,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> Arc<AtomicUsize> {
            Arc::clone(&self.calls)
        }
    }

    #[async_trait]
    impl Phase for CountingPhase {
        fn name(&self) -> &str {
            &self.name
        }

        async fn execute(&self, input: Input) -> anyhow::Result<Output> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            (self.body)(&input)
        }
    }

    fn identity(input: &Input) -> anyhow::Result<Output> {
        Ok(input.clone())
    }

    fn add_one(input: &Input) -> anyhow::Result<Output> {
        Ok(json!({ "value": demos::read_value(input)? + 1 }))
    }

    async fn run(process: Process, start: &str, input: Value) -> ProcessOutcome {
        execute_process(
            Arc::new(process),
            &Beginning::new("start", start),
            ExecutionOptions::new().with_input(input),
        )
        .await
        .expect("process should run")
    }

    async fn run_demo(demo: demos::Demo, input: Value) -> ProcessOutcome {
        execute_process(
            demo.process,
            &demo.beginning,
            ExecutionOptions::new().with_input(input),
        )
        .await
        .expect("demo should run")
    }

    fn stages_for(events: &[Event], category: EventCategory, source_id: &str) -> Vec<Stage> {
        events
            .iter()
            .filter(|event| event.category == category && event.source_id == source_id)
            .map(|event| event.stage)
            .collect()
    }

    #[tokio::test]
    async fn test_linear_pipeline() {
        let outcome = run_demo(demos::linear_pipeline(), json!({ "value": 10 })).await;

        assert_eq!(outcome.phase_results.len(), 3);
        assert_eq!(outcome.phase_results["A"], json!({ "value": 11 }));
        assert_eq!(outcome.phase_results["B"], json!({ "value": 22 }));
        assert_eq!(
            outcome.phase_results["C"],
            json!({ "value": "The final number is: 22" })
        );
        assert_eq!(
            outcome.results["end"],
            json!({ "value": "The final number is: 22" })
        );
        assert!(outcome.is_clean());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fan_out_with_two_terminations() {
        let outcome = run_demo(demos::fan_out(), json!({ "value": 10 })).await;

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.results["end"], json!({ "value": 22 }));
        assert_eq!(outcome.results["end2"], json!({ "value": 121 }));
        assert!(outcome.is_clean());
    }

    #[tokio::test]
    async fn test_decision_terminates_when_value_is_large() {
        let outcome = run_demo(demos::decision_routing(), json!({ "value": 10 })).await;

        assert_eq!(outcome.phase_results["B"], json!({ "value": 22 }));
        assert_eq!(outcome.results[DECISION_TERMINATION_ID], json!({ "value": 22 }));
        assert!(!outcome.phase_results.contains_key("C"));
        assert!(!outcome.results.contains_key("end"));
    }

    #[tokio::test]
    async fn test_decision_routes_small_values_onward() {
        let outcome = run_demo(demos::decision_routing(), json!({ "value": 1 })).await;

        assert_eq!(outcome.phase_results["B"], json!({ "value": 4 }));
        assert_eq!(
            outcome.results["end"],
            json!({ "value": "The final number is: 4" })
        );
        assert!(!outcome.results.contains_key(DECISION_TERMINATION_ID));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_aggregator_joins_two_branches_once() {
        let collector = Arc::new(CollectingObserver::new());
        let demo = demos::aggregate_join();

        let outcome = execute_process(
            demo.process,
            &demo.beginning,
            ExecutionOptions::new()
                .with_input(json!({ "value": 10 }))
                .with_observer(collector.clone()),
        )
        .await
        .unwrap();

        assert_eq!(outcome.results["total"], json!({ "value": 143 }));
        assert_eq!(outcome.phase_results["E"], json!({ "value": 143 }));
        assert_eq!(outcome.context["E.values"].as_array().unwrap().len(), 2);
        assert!(outcome.pending_joins.is_empty());

        let events = collector.events().await;
        let ready = stages_for(&events, EventCategory::Aggregator, "E")
            .into_iter()
            .filter(|stage| *stage == Stage::Ready)
            .count();
        let terminations = events
            .iter()
            .filter(|event| {
                event.category == EventCategory::Termination
                    && event.transition_id.as_deref() == Some("total")
            })
            .count();
        assert_eq!(ready, 1);
        assert_eq!(terminations, 1);
    }

    #[tokio::test]
    async fn test_validation_gate_runs_nothing() {
        let phase = CountingPhase::new("a", identity);
        let calls = phase.calls();
        let process = Process::new("gated")
            .with_node(PhaseNode::new("a", phase).with_next(Connection::new("a-ghost", "ghost")));

        let error = execute_process(
            Arc::new(process),
            &Beginning::new("start", "a"),
            ExecutionOptions::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        match error {
            ExecutionError::InvalidProcess { process, errors } => {
                assert_eq!(process, "gated");
                assert_eq!(
                    errors,
                    vec![ValidationError::DanglingConnection {
                        node_id: "a".to_string(),
                        connection_id: "a-ghost".to_string(),
                        target_node_id: "ghost".to_string(),
                    }]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_beginning_target_is_rejected() {
        let process = Process::new("p").with_node(PhaseNode::new("a", CountingPhase::new("a", identity)));

        let error = execute_process(
            Arc::new(process),
            &Beginning::new("start", "nowhere"),
            ExecutionOptions::new(),
        )
        .await
        .unwrap_err();

        assert!(error.to_string().contains("Beginning 'start' targets 'nowhere'"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cycle_executes_each_node_once() {
        let a = CountingPhase::new("a", add_one);
        let b = CountingPhase::new("b", add_one);
        let (a_calls, b_calls) = (a.calls(), b.calls());
        let process = Process::new("cycle")
            .with_node(PhaseNode::new("a", a).with_next(Connection::new("a-b", "b")))
            .with_node(PhaseNode::new("b", b).with_next(Connection::new("b-a", "a")));

        let outcome = run(process, "a", json!({ "value": 0 })).await;

        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.phase_results["a"], json!({ "value": 1 }));
        assert_eq!(outcome.phase_results["b"], json!({ "value": 2 }));
        assert!(outcome.results.is_empty());
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_converging_branches_share_one_execution() {
        let sink = CountingPhase::new("d", identity).with_delay(Duration::from_millis(50));
        let sink_calls = sink.calls();
        let process = Process::new("diamond")
            .with_node(PhaseNode::new("a", CountingPhase::new("a", identity)).with_next(vec![
                Connection::new("a-b", "b"),
                Connection::new("a-c", "c"),
            ]))
            .with_node(PhaseNode::new("b", CountingPhase::new("b", identity)).with_next(Connection::new("b-d", "d")))
            .with_node(PhaseNode::new("c", CountingPhase::new("c", identity)).with_next(Connection::new("c-d", "d")))
            .with_node(PhaseNode::new("d", sink).with_next(Termination::new("end")));

        let outcome = run(process, "a", json!({ "value": 5 })).await;

        assert_eq!(sink_calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.results["end"], json!({ "value": 5 }));
    }

    #[tokio::test]
    async fn test_failed_transform_skips_only_its_connection() {
        let process = Process::new("transform")
            .with_node(PhaseNode::new("a", CountingPhase::new("a", identity)).with_next(vec![
                Connection::new("a-b", "b").with_transform_fn(|_, context| {
                    context.insert("leaked".to_string(), json!(true));
                    anyhow::bail!("cannot reshape")
                }),
                Connection::new("a-c", "c").with_transform_fn(|output, context| {
                    context.insert("routed".to_string(), json!("c"));
                    Ok(json!({ "wrapped": output }))
                }),
            ]))
            .with_node(PhaseNode::new("b", CountingPhase::new("b", identity)).with_next(Termination::new("from-b")))
            .with_node(PhaseNode::new("c", CountingPhase::new("c", identity)).with_next(Termination::new("from-c")));

        let outcome = run(process, "a", json!({ "value": 1 })).await;

        assert_eq!(outcome.results["from-c"], json!({ "wrapped": { "value": 1 } }));
        assert!(!outcome.results.contains_key("from-b"));
        assert!(!outcome.context.contains_key("leaked"));
        assert_eq!(outcome.context["routed"], json!("c"));

        let errors: Vec<_> = outcome.errors_for("a-b").collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Transform);
        assert_eq!(
            errors[0].error,
            ExecutionError::TransformFailed {
                connection_id: "a-b".to_string(),
                target_node_id: "b".to_string(),
                message: "cannot reshape".to_string(),
            }
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failed_decision_does_not_block_siblings() {
        let process = Process::new("decisions").with_node(
            PhaseNode::new("a", CountingPhase::new("a", identity)).with_next(vec![
                Decision::from_fn("broken", |_, _| anyhow::bail!("no route")),
                Decision::from_fn("fine", |_, _| Ok(DecisionOutcome::terminate("ok"))),
            ]),
        );

        let outcome = run(process, "a", json!({ "value": 3 })).await;

        assert_eq!(outcome.results["ok"], json!({ "value": 3 }));
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].source_id, "broken");
        assert_eq!(outcome.errors[0].kind, ErrorKind::Decision);
    }

    /// Phase that stamps the context's `route` key onto its input.
    struct RouteReader;

    #[async_trait]
    impl Phase for RouteReader {
        fn name(&self) -> &str {
            "route-reader"
        }

        async fn prepare(&self, input: Input, context: &mut Context) -> anyhow::Result<Input> {
            let route = context.get("route").cloned().unwrap_or(Value::Null);
            Ok(json!({ "value": input["value"], "route": route }))
        }

        async fn execute(&self, input: Input) -> anyhow::Result<Output> {
            Ok(input)
        }
    }

    #[tokio::test]
    async fn test_decision_context_writes_reach_downstream_nodes() {
        let process = Process::new("routed")
            .with_node(PhaseNode::new("a", CountingPhase::new("a", identity)).with_next(
                Decision::from_fn("route", |output, context| {
                    let lane = if demos::read_value(output)? > 5 { "large" } else { "small" };
                    context.insert("route".to_string(), json!(lane));
                    Ok(DecisionOutcome::connect([Connection::new("route-b", "b")]))
                }),
            ))
            .with_node(PhaseNode::new("b", RouteReader));

        let outcome = run(process, "a", json!({ "value": 9 })).await;

        assert_eq!(outcome.results["b"], json!({ "value": 9, "route": "large" }));
        assert_eq!(outcome.context["route"], json!("large"));
        assert!(outcome.is_clean());
    }

    #[tokio::test]
    async fn test_decision_with_no_connections_ends_under_its_id() {
        let process = Process::new("stop").with_node(
            PhaseNode::new("a", CountingPhase::new("a", identity))
                .with_next(Decision::from_fn("halt", |_, _| Ok(DecisionOutcome::stop()))),
        );

        let outcome = run(process, "a", json!({ "value": 8 })).await;

        assert_eq!(outcome.results["halt"], json!({ "value": 8 }));
        assert!(outcome.is_clean());
    }

    #[tokio::test]
    async fn test_decision_to_unknown_node_records_error() {
        let process = Process::new("dynamic").with_node(
            PhaseNode::new("a", CountingPhase::new("a", identity)).with_next(Decision::from_fn(
                "route",
                |_, _| Ok(DecisionOutcome::connect([Connection::new("late", "ghost")])),
            )),
        );

        let outcome = run(process, "a", json!({})).await;

        assert_eq!(
            outcome.errors_for("ghost").next().map(|recorded| &recorded.error),
            Some(&ExecutionError::NodeNotFound {
                node_id: "ghost".to_string()
            })
        );
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn test_termination_hook_failure_still_records_result() {
        let finalized = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&finalized);
        let process = Process::new("terminate")
            .with_node(PhaseNode::new("a", CountingPhase::new("a", identity)).with_next(vec![
                Connection::new("a-b", "b"),
                Connection::new("a-c", "c"),
            ]))
            .with_node(PhaseNode::new("b", CountingPhase::new("b", identity)).with_next(
                Termination::new("bad").with_terminate_fn(|_, _| anyhow::bail!("cannot flush")),
            ))
            .with_node(PhaseNode::new("c", CountingPhase::new("c", identity)).with_next(
                Termination::new("good").with_terminate_fn(move |output, context| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    context.insert("flushed".to_string(), output.clone());
                    Ok(json!("ignored"))
                }),
            ));

        let outcome = run(process, "a", json!({ "value": 2 })).await;

        assert_eq!(outcome.results["bad"], json!({ "value": 2 }));
        assert_eq!(outcome.results["good"], json!({ "value": 2 }));
        assert_eq!(outcome.context["flushed"], json!({ "value": 2 }));
        assert_eq!(finalized.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].kind, ErrorKind::Termination);
    }

    #[tokio::test]
    async fn test_implicit_termination_uses_node_id() {
        let process = Process::new("implicit").with_node(PhaseNode::new("only", CountingPhase::new("only", add_one)));

        let outcome = run(process, "only", json!({ "value": 41 })).await;

        assert_eq!(outcome.results["only"], json!({ "value": 42 }));
        assert_eq!(outcome.results["only"], outcome.phase_results["only"]);
    }

    struct Strict;

    #[async_trait]
    impl Phase for Strict {
        fn name(&self) -> &str {
            "strict"
        }

        async fn verify(&self, input: &Input) -> Verification {
            let mut messages = Vec::new();
            if input.get("value").is_none() {
                messages.push("value is required");
            }
            if input.get("unit").is_none() {
                messages.push("unit is required");
            }
            if messages.is_empty() {
                Verification::passed()
            } else {
                Verification::failed(messages)
            }
        }

        async fn execute(&self, input: Input) -> anyhow::Result<Output> {
            Ok(input)
        }
    }

    #[tokio::test]
    async fn test_verification_failure_stops_node() {
        let process = Process::new("verify")
            .with_node(PhaseNode::new("strict", Strict).with_next(Termination::new("end")));

        let outcome = run(process, "strict", json!({})).await;

        assert!(outcome.results.is_empty());
        assert!(outcome.phase_results.is_empty());
        let kinds: Vec<ErrorKind> = outcome.errors.iter().map(|recorded| recorded.kind).collect();
        assert_eq!(kinds, vec![ErrorKind::Node, ErrorKind::Critical]);
        assert_eq!(
            outcome.errors[0].error.to_string(),
            "Node 'strict' failed verification:\nvalue is required\nunit is required"
        );
    }

    struct Hooked;

    #[async_trait]
    impl Phase for Hooked {
        fn name(&self) -> &str {
            "hooked"
        }

        async fn prepare(&self, input: Input, context: &mut Context) -> anyhow::Result<Input> {
            context.insert("prepared".to_string(), json!(true));
            Ok(json!({ "value": demos::read_value(&input)? * 10 }))
        }

        async fn execute(&self, input: Input) -> anyhow::Result<Output> {
            add_one(&input)
        }

        async fn process(&self, output: Output, context: &mut Context) -> anyhow::Result<Output> {
            context.insert("processed".to_string(), output.clone());
            Ok(json!({ "value": demos::read_value(&output)?, "processed": true }))
        }
    }

    #[tokio::test]
    async fn test_prepare_and_process_hooks_rewrite_values_and_context() {
        let process = Process::new("hooks").with_node(PhaseNode::new("h", Hooked));

        let outcome = run(process, "h", json!({ "value": 2 })).await;

        assert_eq!(outcome.phase_results["h"], json!({ "value": 21, "processed": true }));
        assert_eq!(outcome.context["prepared"], json!(true));
        assert_eq!(outcome.context["processed"], json!({ "value": 21 }));
    }

    #[tokio::test]
    async fn test_failing_phase_is_recorded_and_siblings_finish() {
        let process = Process::new("partial")
            .with_node(PhaseNode::new("a", CountingPhase::new("a", identity)).with_next(vec![
                Connection::new("a-b", "b"),
                Connection::new("a-c", "c"),
            ]))
            .with_node(
                PhaseNode::from_fn("b", |_| async move {
                    Err::<Output, _>(anyhow::anyhow!("b exploded"))
                })
                    .with_next(Termination::new("from-b")),
            )
            .with_node(PhaseNode::new("c", CountingPhase::new("c", identity)).with_next(Termination::new("from-c")));

        let outcome = run(process, "a", json!({ "value": 1 })).await;

        assert_eq!(outcome.results.len(), 1);
        assert!(outcome.results.contains_key("from-c"));
        assert_eq!(
            outcome.errors_for("b").next().map(|recorded| recorded.error.clone()),
            Some(ExecutionError::PhaseFailed {
                node_id: "b".to_string(),
                message: "b exploded".to_string(),
            })
        );
        // the start node itself succeeded, so nothing is critical
        assert!(outcome.errors.iter().all(|recorded| recorded.kind != ErrorKind::Critical));
    }

    #[tokio::test]
    async fn test_panicking_phase_is_recorded() {
        let process = Process::new("panic").with_node(PhaseNode::from_fn("boom", |_| async move {
            if true {
                panic!("phase blew up");
            }
            anyhow::Ok(Value::Null)
        }));

        let outcome = run(process, "boom", json!({})).await;

        assert_eq!(
            outcome.errors[0].error,
            ExecutionError::TaskFailed {
                node_id: "boom".to_string(),
                message: "phase blew up".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_event_order_for_linear_pipeline() {
        let collector = Arc::new(CollectingObserver::new());
        let demo = demos::linear_pipeline();

        execute_process(
            demo.process,
            &demo.beginning,
            ExecutionOptions::new()
                .with_input(json!({ "value": 10 }))
                .with_observer(collector.clone()),
        )
        .await
        .unwrap();

        let events = collector.events().await;
        let first: Vec<(EventCategory, Stage)> = events
            .iter()
            .take(3)
            .map(|event| (event.category, event.stage))
            .collect();
        assert_eq!(
            first,
            vec![
                (EventCategory::Process, Stage::Start),
                (EventCategory::Beginning, Stage::Start),
                (EventCategory::Beginning, Stage::Begin),
            ]
        );
        let last = events.last().unwrap();
        assert_eq!((last.category, last.stage), (EventCategory::Process, Stage::End));

        assert_eq!(
            stages_for(&events, EventCategory::Node, "A"),
            vec![Stage::Start, Stage::Prepared, Stage::Processed, Stage::End]
        );
        assert_eq!(
            stages_for(&events, EventCategory::Phase, "A"),
            vec![Stage::Start, Stage::Execute]
        );
        assert_eq!(
            stages_for(&events, EventCategory::Connection, "A"),
            vec![Stage::Start, Stage::End]
        );
        assert_eq!(
            stages_for(&events, EventCategory::Termination, "C"),
            vec![Stage::Start]
        );

        let position = |category: EventCategory, source: &str, stage: Stage| {
            events
                .iter()
                .position(|event| {
                    event.category == category && event.source_id == source && event.stage == stage
                })
                .unwrap()
        };
        assert!(
            position(EventCategory::Phase, "A", Stage::Execute)
                < position(EventCategory::Node, "B", Stage::Start)
        );
    }

    #[tokio::test]
    async fn test_process_events_carry_context_snapshots() {
        let collector = Arc::new(CollectingObserver::new());
        let mut context = Context::new();
        context.insert("tier".to_string(), json!("pro"));
        let process = Process::new("snapshots").with_node(
            PhaseNode::new("a", CountingPhase::new("a", add_one)).with_next(
                Termination::new("end").with_terminate_fn(|output, context| {
                    context.insert("flushed".to_string(), output.clone());
                    Ok(output.clone())
                }),
            ),
        );

        let outcome = execute_process(
            Arc::new(process),
            &Beginning::new("start", "a"),
            ExecutionOptions::new()
                .with_input(json!({ "value": 1 }))
                .with_context(context)
                .with_observer(collector.clone()),
        )
        .await
        .unwrap();

        let events = collector.events().await;
        let first = events.first().unwrap();
        let last = events.last().unwrap();
        assert_eq!((first.category, first.stage), (EventCategory::Process, Stage::Start));
        assert_eq!(first.payload.context.as_ref().unwrap().len(), 1);
        assert_eq!((last.category, last.stage), (EventCategory::Process, Stage::End));
        assert_eq!(last.payload.context.as_ref(), Some(&outcome.context));
        assert_eq!(outcome.context["flushed"], json!({ "value": 2 }));
        assert!(events
            .iter()
            .filter(|event| event.category != EventCategory::Process)
            .all(|event| event.payload.context.is_none()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_runs_share_aggregator_without_crosstalk() {
        let shared: Arc<dyn crate::traits::Aggregator> = Arc::new(SumAggregator::new("sum", 2));
        let build = |aggregator: Arc<dyn crate::traits::Aggregator>| {
            Arc::new(
                Process::new("shared")
                    .with_node(PhaseNode::new("a", CountingPhase::new("a", identity)).with_next(vec![
                        Connection::new("a-b", "b"),
                        Connection::new("a-c", "c"),
                    ]))
                    .with_node(
                        PhaseNode::new("b", CountingPhase::new("b", add_one).with_delay(Duration::from_millis(20)))
                            .with_next(Connection::new("b-sum", "sum")),
                    )
                    .with_node(PhaseNode::new("c", CountingPhase::new("c", add_one)).with_next(Connection::new("c-sum", "sum")))
                    .with_node(
                        AggregatorNode::from_arc("sum", aggregator).with_next(Termination::new("total")),
                    ),
            )
        };
        let first = build(Arc::clone(&shared));
        let second = build(Arc::clone(&shared));
        let beginning = Beginning::new("start", "a");

        let (left, right) = tokio::join!(
            execute_process(first, &beginning, ExecutionOptions::new().with_input(json!({ "value": 1 }))),
            execute_process(second, &beginning, ExecutionOptions::new().with_input(json!({ "value": 100 }))),
        );
        let (left, right) = (left.unwrap(), right.unwrap());

        assert_eq!(left.results["total"], json!({ "value": 4 }));
        assert_eq!(right.results["total"], json!({ "value": 202 }));
        assert_eq!(left.context["sum.values"], json!([2, 2]));
        assert_eq!(right.context["sum.values"], json!([101, 101]));
    }

    #[tokio::test]
    async fn test_unready_join_is_reported_not_awaited() {
        let process = Process::new("short")
            .with_node(PhaseNode::new("a", CountingPhase::new("a", identity)).with_next(vec![
                Connection::new("a-e1", "e"),
                Connection::new("a-e2", "e"),
            ]))
            .with_node(AggregatorNode::new("e", SumAggregator::new("e", 3)).with_next(Termination::new("total")));

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            run(process, "a", json!({ "value": 1 })),
        )
        .await
        .expect("a pending join must not hang the run");

        assert_eq!(outcome.pending_joins, vec!["e".to_string()]);
        assert!(!outcome.results.contains_key("total"));
        assert!(!outcome.phase_results.contains_key("e"));
        assert!(!outcome.is_clean());
    }

    fn always_ready(policy: Option<JoinPolicy>, fired: Arc<AtomicUsize>) -> Process {
        let mut aggregator = AggregatorNode::from_fn("e", |input, _| Ok(Aggregation::Ready(input)))
            .with_next(Termination::new("total").with_terminate_fn(move |output, _| {
                fired.fetch_add(1, Ordering::SeqCst);
                Ok(output.clone())
            }));
        if let Some(policy) = policy {
            aggregator = aggregator.with_join_policy(policy);
        }

        Process::new("ready")
            .with_node(PhaseNode::new("a", CountingPhase::new("a", identity)).with_next(vec![
                Connection::new("a-b", "b"),
                Connection::new("a-c", "c"),
            ]))
            .with_node(PhaseNode::new("b", CountingPhase::new("b", identity)).with_next(Connection::new("b-e", "e")))
            .with_node(
                PhaseNode::new("c", CountingPhase::new("c", identity).with_delay(Duration::from_millis(20)))
                    .with_next(Connection::new("c-e", "e")),
            )
            .with_node(aggregator)
    }

    #[tokio::test]
    async fn test_once_policy_fires_aggregator_a_single_time() {
        let fired = Arc::new(AtomicUsize::new(0));

        let outcome = run(always_ready(None, Arc::clone(&fired)), "a", json!({ "value": 1 })).await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.results["total"], json!({ "value": 1 }));
    }

    #[tokio::test]
    async fn test_rearm_policy_fires_for_every_ready_arrival() {
        let fired = Arc::new(AtomicUsize::new(0));

        let outcome = run(
            always_ready(Some(JoinPolicy::Rearm), Arc::clone(&fired)),
            "a",
            json!({ "value": 1 }),
        )
        .await;

        assert_eq!(fired.load(Ordering::SeqCst), 2);
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn test_engine_join_policy_applies_without_node_override() {
        let fired = Arc::new(AtomicUsize::new(0));
        let executor = ProcessExecutor::new(EngineConfig {
            join_policy: JoinPolicy::Rearm,
            ..EngineConfig::default()
        });

        executor
            .execute(
                Arc::new(always_ready(None, Arc::clone(&fired))),
                &Beginning::new("start", "a"),
                ExecutionOptions::new().with_input(json!({ "value": 1 })),
            )
            .await
            .unwrap();

        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_beginning_hook_shapes_first_input() {
        let process = Process::new("begin").with_node(PhaseNode::new("a", CountingPhase::new("a", add_one)));
        let beginning = Beginning::new("start", "a").with_begin_fn(|input, context| {
            context.insert("raw".to_string(), input.clone());
            Ok(json!({ "value": input.as_i64().unwrap_or_default() }))
        });

        let outcome = execute_process(
            Arc::new(process),
            &beginning,
            ExecutionOptions::new().with_input(json!(9)),
        )
        .await
        .unwrap();

        assert_eq!(outcome.results["a"], json!({ "value": 10 }));
        assert_eq!(outcome.context["raw"], json!(9));
    }

    #[tokio::test]
    async fn test_failing_beginning_fails_the_run() {
        let phase = CountingPhase::new("a", identity);
        let calls = phase.calls();
        let process = Process::new("begin").with_node(PhaseNode::new("a", phase));
        let beginning =
            Beginning::new("start", "a").with_begin_fn(|_, _| anyhow::bail!("no input"));

        let error = execute_process(Arc::new(process), &beginning, ExecutionOptions::new())
            .await
            .unwrap_err();

        assert_eq!(
            error,
            ExecutionError::BeginningFailed {
                beginning_id: "start".to_string(),
                message: "no input".to_string(),
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_configured_context_is_seeded_and_overridable() {
        let mut initial_context = Context::new();
        initial_context.insert("region".to_string(), json!("eu"));
        initial_context.insert("tier".to_string(), json!("free"));
        let executor = ProcessExecutor::new(EngineConfig {
            initial_context,
            ..EngineConfig::default()
        });

        let mut context = Context::new();
        context.insert("tier".to_string(), json!("pro"));
        let process = Process::new("ctx").with_node(PhaseNode::new("a", CountingPhase::new("a", identity)));

        let outcome = executor
            .execute(
                Arc::new(process),
                &Beginning::new("start", "a"),
                ExecutionOptions::new().with_context(context),
            )
            .await
            .unwrap();

        assert_eq!(outcome.context["region"], json!("eu"));
        assert_eq!(outcome.context["tier"], json!("pro"));
    }

    #[tokio::test]
    async fn test_event_logging_from_config_does_not_disturb_run() {
        let mut config = EngineConfig::default();
        config.event_logging.enabled = true;
        config.event_logging.label = Some("fan-out".to_string());

        let demo = demos::fan_out();
        let outcome = ProcessExecutor::from_config(&config)
            .execute(
                demo.process,
                &demo.beginning,
                ExecutionOptions::new().with_input(json!({ "value": 10 })),
            )
            .await
            .unwrap();

        assert_eq!(outcome.results["end2"], json!({ "value": 121 }));
    }

    #[tokio::test]
    async fn test_long_chain_completes() {
        let length = 500;
        let mut process = Process::new("chain");
        for index in 0..length {
            let node = PhaseNode::new(format!("n{index}"), CountingPhase::new("step", add_one));
            let node = if index + 1 < length {
                node.with_next(Connection::new(format!("n{index}-next"), format!("n{}", index + 1)))
            } else {
                node.with_next(Termination::new("end"))
            };
            process.add_node(node);
        }

        let outcome = run(process, "n0", json!({ "value": 0 })).await;

        assert_eq!(outcome.results["end"], json!({ "value": length }));
    }

    #[tokio::test]
    async fn test_into_parts_returns_results_phase_results_and_context() {
        let (results, phase_results, context) =
            run_demo(demos::linear_pipeline(), json!({ "value": 10 }))
                .await
                .into_parts();

        assert_eq!(results.len(), 1);
        assert_eq!(phase_results.len(), 3);
        assert!(context.is_empty());
    }

    struct SlowObserver {
        seen: AtomicUsize,
    }

    #[async_trait]
    impl Observer for SlowObserver {
        async fn on_event(&self, _event: &Event) {
            tokio::time::sleep(Duration::from_millis(1)).await;
            self.seen.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_observers_are_awaited_before_the_run_returns() {
        let observer = Arc::new(SlowObserver {
            seen: AtomicUsize::new(0),
        });
        let collector = Arc::new(CollectingObserver::new());
        let demo = demos::aggregate_join();

        execute_process(
            demo.process,
            &demo.beginning,
            ExecutionOptions::new()
                .with_input(json!({ "value": 2 }))
                .with_observer(observer.clone())
                .with_observer(collector.clone()),
        )
        .await
        .unwrap();

        assert_eq!(observer.seen.load(Ordering::SeqCst), collector.events().await.len());
    }
}
