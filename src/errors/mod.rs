// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod execution;
mod validation;

pub use config::ConfigError;
pub use execution::{ErrorKind, ExecutionError, ExecutionResult, RecordedError};
pub use validation::ValidationError;
