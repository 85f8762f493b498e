// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Reference processes over `{"value": <integer>}` payloads.
//!
//! | name        | shape                                                      |
//! |-------------|------------------------------------------------------------|
//! | `linear`    | A(+1) → B(×2) → C(stringify) → `end`                       |
//! | `fan-out`   | A(+1) → B(×2) → `end`, A → D(square) → `end2`              |
//! | `decision`  | A(+1) → B(×2) → `check`: value > 5 ends, else C → `end`    |
//! | `aggregate` | A(+1) → B(×2), D(square) → E(sum of 2) → `total`           |
//!
//! The demo binary runs these and the engine tests assert on them.

use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::graph::{
    AggregatorNode, Beginning, Connection, Context, Decision, DecisionOutcome, Input, Output,
    PhaseNode, Process, Termination,
};
use crate::traits::{Aggregation, Aggregator};

pub const DECISION_TERMINATION_ID: &str = "decision-end";

/// A named process ready to run.
pub struct Demo {
    pub name: &'static str,
    pub description: &'static str,
    pub process: Arc<Process>,
    pub beginning: Beginning,
}

/// Every reference process, in presentation order.
pub fn all() -> Vec<Demo> {
    vec![
        linear_pipeline(),
        fan_out(),
        decision_routing(),
        aggregate_join(),
    ]
}

pub fn by_name(name: &str) -> Option<Demo> {
    all().into_iter().find(|demo| demo.name == name)
}

pub fn read_value(input: &Value) -> anyhow::Result<i64> {
    input
        .get("value")
        .and_then(Value::as_i64)
        .with_context(|| format!("expected an integer 'value' in {}", input))
}

fn add_one(input: &Input) -> anyhow::Result<Output> {
    let value = read_value(input)?;
    Ok(json!({ "value": value + 1 }))
}

fn double(input: &Input) -> anyhow::Result<Output> {
    let value = read_value(input)?;
    Ok(json!({ "value": value * 2 }))
}

fn square(input: &Input) -> anyhow::Result<Output> {
    let value = read_value(input)?;
    value
        .checked_mul(value)
        .map(|squared| json!({ "value": squared }))
        .with_context(|| format!("{} squared overflows", value))
}

fn stringify(input: &Input) -> anyhow::Result<Output> {
    let value = read_value(input)?;
    Ok(json!({ "value": format!("The final number is: {}", value) }))
}

fn phase(id: &str, body: fn(&Input) -> anyhow::Result<Output>) -> PhaseNode {
    PhaseNode::from_fn(id, move |input| async move { body(&input) })
}

/// Sums `expected` integer inputs, keeping the running values in the context
/// under `<name>.values`.
pub struct SumAggregator {
    name: String,
    expected: usize,
}

impl SumAggregator {
    pub fn new(name: impl Into<String>, expected: usize) -> Self {
        Self {
            name: name.into(),
            expected,
        }
    }

    fn context_key(&self) -> String {
        format!("{}.values", self.name)
    }
}

#[async_trait]
impl Aggregator for SumAggregator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn aggregate(&self, input: Input, context: &mut Context) -> anyhow::Result<Aggregation> {
        let value = read_value(&input)?;
        let values = context
            .entry(self.context_key())
            .or_insert_with(|| json!([]))
            .as_array_mut()
            .with_context(|| format!("context key '{}' is not an array", self.context_key()))?;
        values.push(json!(value));

        if values.len() < self.expected {
            return Ok(Aggregation::NotYetReady);
        }
        let total: i64 = values.iter().filter_map(Value::as_i64).sum();
        Ok(Aggregation::Ready(json!({ "value": total })))
    }
}

pub fn linear_pipeline() -> Demo {
    let process = Process::new("linear")
        .with_node(phase("A", add_one).with_next(Connection::new("A-B", "B")))
        .with_node(phase("B", double).with_next(Connection::new("B-C", "C")))
        .with_node(phase("C", stringify).with_next(Termination::new("end")));

    Demo {
        name: "linear",
        description: "A(+1) -> B(x2) -> C(stringify)",
        process: Arc::new(process),
        beginning: Beginning::new("start", "A"),
    }
}

pub fn fan_out() -> Demo {
    let process = Process::new("fan-out")
        .with_node(phase("A", add_one).with_next(vec![
            Connection::new("A-B", "B"),
            Connection::new("A-D", "D"),
        ]))
        .with_node(phase("B", double).with_next(Termination::new("end")))
        .with_node(phase("D", square).with_next(Termination::new("end2")));

    Demo {
        name: "fan-out",
        description: "A(+1) -> B(x2) -> end, A -> D(square) -> end2",
        process: Arc::new(process),
        beginning: Beginning::new("start", "A"),
    }
}

pub fn decision_routing() -> Demo {
    let check = Decision::from_fn("check", |output, _context| {
        if read_value(output)? > 5 {
            Ok(DecisionOutcome::terminate(DECISION_TERMINATION_ID))
        } else {
            Ok(DecisionOutcome::connect([Connection::new("B-C", "C")]))
        }
    });

    let process = Process::new("decision")
        .with_node(phase("A", add_one).with_next(Connection::new("A-B", "B")))
        .with_node(phase("B", double).with_next(check))
        .with_node(phase("C", stringify).with_next(Termination::new("end")));

    Demo {
        name: "decision",
        description: "A(+1) -> B(x2) -> check: value > 5 ends, else C(stringify)",
        process: Arc::new(process),
        beginning: Beginning::new("start", "A"),
    }
}

pub fn aggregate_join() -> Demo {
    let process = Process::new("aggregate")
        .with_node(phase("A", add_one).with_next(vec![
            Connection::new("A-B", "B"),
            Connection::new("A-D", "D"),
        ]))
        .with_node(phase("B", double).with_next(Connection::new("B-E", "E")))
        .with_node(phase("D", square).with_next(Connection::new("D-E", "E")))
        .with_node(
            AggregatorNode::new("E", SumAggregator::new("E", 2))
                .with_next(Termination::new("total")),
        );

    Demo {
        name: "aggregate",
        description: "A(+1) -> B(x2), D(square) -> E(sum of both)",
        process: Arc::new(process),
        beginning: Beginning::new("start", "A"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_phases() {
        assert_eq!(add_one(&json!({"value": 10})).unwrap(), json!({"value": 11}));
        assert_eq!(double(&json!({"value": 11})).unwrap(), json!({"value": 22}));
        assert_eq!(square(&json!({"value": 11})).unwrap(), json!({"value": 121}));
        assert_eq!(
            stringify(&json!({"value": 22})).unwrap(),
            json!({"value": "The final number is: 22"})
        );
    }

    #[test]
    fn test_read_value_rejects_missing_value() {
        let error = read_value(&json!({"other": 1})).unwrap_err();
        assert!(error.to_string().contains("expected an integer 'value'"));
    }

    #[test]
    fn test_square_reports_overflow() {
        assert!(square(&json!({"value": i64::MAX})).is_err());
    }

    #[test]
    fn test_demos_are_valid() {
        for demo in all() {
            assert!(
                crate::graph::validate_process(&demo.process).is_ok(),
                "{} should validate",
                demo.name
            );
        }
        assert!(by_name("aggregate").is_some());
        assert!(by_name("nope").is_none());
    }
}
