// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::time::SystemTime;

use serde::Serialize;
use serde_json::Value;

use crate::graph::Context;

/// What part of the process an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Process,
    Beginning,
    Node,
    Phase,
    Aggregator,
    Connection,
    Decision,
    Termination,
}

/// Lifecycle point within a category.
///
/// | category    | stages                                  |
/// |-------------|-----------------------------------------|
/// | process     | start, end                              |
/// | beginning   | start, begin                            |
/// | node        | start, prepared, processed, end         |
/// | phase       | start, execute                          |
/// | aggregator  | start, aggregate, ready, defer          |
/// | connection  | start, transform, end                   |
/// | decision    | start, decide, end                      |
/// | termination | start, terminate                        |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    End,
    Begin,
    Prepared,
    Processed,
    Execute,
    Aggregate,
    Ready,
    Defer,
    Transform,
    Decide,
    Terminate,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventCategory::Process => "process",
            EventCategory::Beginning => "beginning",
            EventCategory::Node => "node",
            EventCategory::Phase => "phase",
            EventCategory::Aggregator => "aggregator",
            EventCategory::Connection => "connection",
            EventCategory::Decision => "decision",
            EventCategory::Termination => "termination",
        };
        f.write_str(label)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Start => "start",
            Stage::End => "end",
            Stage::Begin => "begin",
            Stage::Prepared => "prepared",
            Stage::Processed => "processed",
            Stage::Execute => "execute",
            Stage::Aggregate => "aggregate",
            Stage::Ready => "ready",
            Stage::Defer => "defer",
            Stage::Transform => "transform",
            Stage::Decide => "decide",
            Stage::Terminate => "terminate",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Snapshot of the run context; only process events carry one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
}

/// A lifecycle notification.
///
/// `source_id` is the process name for process events, the beginning id for
/// beginning events and the node id otherwise. Transition events also carry
/// the id of the transition in `transition_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub timestamp: SystemTime,
    pub category: EventCategory,
    pub source_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_id: Option<String>,
    pub stage: Stage,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(category: EventCategory, source_id: impl Into<String>, stage: Stage) -> Self {
        Self {
            timestamp: SystemTime::now(),
            category,
            source_id: source_id.into(),
            transition_id: None,
            stage,
            payload: EventPayload::default(),
        }
    }

    pub fn with_transition(mut self, transition_id: impl Into<String>) -> Self {
        self.transition_id = Some(transition_id.into());
        self
    }

    pub fn with_input(mut self, input: &Value) -> Self {
        self.payload.input = Some(input.clone());
        self
    }

    pub fn with_output(mut self, output: &Value) -> Self {
        self.payload.output = Some(output.clone());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.payload.detail = Some(detail.into());
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.payload.context = Some(context);
        self
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} {}", self.category, self.stage, self.source_id)?;
        if let Some(transition_id) = &self.transition_id {
            write!(f, " via {}", transition_id)?;
        }
        if let Some(detail) = &self.payload.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}
