// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Process graph model.
//!
//! A [`Process`] owns [`Node`]s keyed by id. Each node carries an optional
//! [`Next`] describing where its output goes. A [`Beginning`] names the entry
//! node of a run. All of it is plain data: building a process performs no I/O
//! and nothing here is mutated once a run starts.

mod node;
mod payload;
mod process;
mod transition;
mod validation;

pub use node::{AggregatorNode, JoinPolicy, Node, PhaseNode};
pub use payload::{Context, Input, Output};
pub use process::Process;
pub use transition::{Beginning, Connection, Decision, DecisionOutcome, Next, Termination};
pub use validation::{validate_beginning, validate_process};
