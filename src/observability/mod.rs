// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and
//! operational logging done by the engine. Message types follow a struct-based
//! pattern with a `Display` implementation to:
//!
//! * Keep log wording out of the engine code
//! * Give every log line the same structured fields
//! * Let the same message open a `tracing` span when work is scoped to it
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - run lifecycle, validation rejection and recorded errors
//! * `messages::node` - node scheduling, caching and aggregator joins
//! * `messages::transition` - connections, decisions and terminations
//!
//! # Usage
//!
//! ```rust
//! use phaseflow::observability::messages::node::NodeFailed;
//! use phaseflow::observability::messages::StructuredLog;
//!
//! let error = std::io::Error::new(std::io::ErrorKind::Other, "test error");
//! let msg = NodeFailed {
//!     node_id: "double",
//!     error: &error,
//! };
//!
//! msg.log();
//! ```

pub mod messages;
