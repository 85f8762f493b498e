// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;     // engine settings loaded from YAML/TOML
pub mod demos;      // reference processes
pub mod engine;     // scheduler, joins, routing, driver
pub mod errors;     // error handling
pub mod events;     // lifecycle events and observers
pub mod graph;      // process graph model + validation
pub mod observability;
pub mod traits;     // units of work and hooks

pub use engine::{execute_process, ExecutionOptions, ProcessExecutor, ProcessOutcome};
