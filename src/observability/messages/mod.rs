// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit it with structured fields at its fixed level.
//!
//! # Organization
//!
//! * `engine` - run lifecycle events
//! * `node` - node lifecycle and join events
//! * `transition` - routing events
//!
//! # Usage Pattern
//!
//! ```rust
//! use phaseflow::observability::messages::engine::RunStarted;
//! use phaseflow::observability::messages::StructuredLog;
//!
//! let msg = RunStarted {
//!     process: "checkout",
//!     node_count: 5,
//!     observer_count: 1,
//! };
//!
//! tracing::info!("{}", msg);
//! let _span = msg.span("execute_process");
//! ```

use tracing::Span;

pub mod engine;
pub mod node;
pub mod transition;

/// Emits a message with structured fields, or opens a span carrying them.
pub trait StructuredLog {
    /// Log the message at its level.
    fn log(&self);

    /// Create a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
