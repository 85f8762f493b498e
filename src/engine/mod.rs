// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Execution engine.
//!
//! * `executor` - process driver and public entry points
//! * `scheduler` - memoized, deduplicated node scheduling
//! * `phase` - phase node execution
//! * `join` - aggregator fan-in barriers
//! * `resolver` - routing of node output through connections, decisions and terminations
//! * `state` - run-scoped shared state

mod executor;
mod join;
mod phase;
mod resolver;
mod scheduler;
mod state;

#[cfg(test)]
mod integration_tests;

pub use executor::{execute_process, ExecutionOptions, ProcessExecutor, ProcessOutcome};
