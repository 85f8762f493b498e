// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Units of work a process is assembled from.
//!
//! The engine only ever talks to these traits. Every callback that may fail
//! returns `anyhow::Result` so implementations can use `?` on whatever they
//! call; the engine records the rendered message against the node or
//! transition that failed.
//!
//! Implementations must keep per-run state inside the [`Context`](crate::graph::Context)
//! they are handed. The same `Arc<dyn Aggregator>` may be shared by several
//! concurrent runs, and only the context is private to one run.

pub mod aggregator;
pub mod hooks;
pub mod observer;
pub mod phase;

pub use aggregator::{Aggregation, Aggregator, FnAggregator};
pub use hooks::{
    Begin, Decide, FnBegin, FnDecide, FnTerminate, FnTransform, Terminate, Transform,
};
pub use observer::Observer;
pub use phase::{FnPhase, Phase, Verification};
