// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Lifecycle events emitted while a process runs.
//!
//! Observers register through [`ExecutionOptions`](crate::engine::ExecutionOptions)
//! and receive every [`Event`] of the run. The helpers here cover the common
//! needs: filtering ([`EventFilter`], [`FilteredObserver`]), forwarding to
//! `tracing` ([`LoggingObserver`]) and recording for inspection
//! ([`CollectingObserver`]).
//!
//! ```rust
//! use std::sync::Arc;
//! use phaseflow::events::{CollectingObserver, EventCategory, EventFilter, FilteredObserver};
//!
//! let terminations = Arc::new(CollectingObserver::new());
//! let observer = FilteredObserver::new(
//!     EventFilter::new().categories([EventCategory::Termination]),
//!     terminations.clone(),
//! );
//! # let _ = observer;
//! ```

mod collector;
mod dispatcher;
mod event;
mod filter;
mod logging;

pub use collector::CollectingObserver;
pub use dispatcher::EventDispatcher;
pub use event::{Event, EventCategory, EventPayload, Stage};
pub use filter::{EventFilter, FilteredObserver};
pub use logging::{EventFormatter, LoggingObserver};
