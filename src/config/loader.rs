// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::ConfigError;
use crate::graph::{Context, JoinPolicy};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Engine-wide settings applied to every run started by a
/// [`ProcessExecutor`](crate::engine::ProcessExecutor).
///
/// Every field is optional in the file.
///
/// # Fields
/// * `join_policy` - Whether aggregators may release more than once per run (defaults to `once`)
/// * `event_logging` - Forward every lifecycle event to `tracing`
/// * `initial_context` - Keys seeded into every run's context before caller-supplied keys
///
/// # Example
/// ```yaml
/// join_policy: once
/// event_logging:
///   enabled: true
///   level: debug
///   label: orders
/// initial_context:
///   region: eu-west
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub join_policy: JoinPolicy,
    pub event_logging: EventLoggingConfig,
    pub initial_context: Context,
}

/// Settings for the built-in [`LoggingObserver`](crate::events::LoggingObserver).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventLoggingConfig {
    pub enabled: bool,
    pub level: LogLevel,
    /// Prefix for every logged event, e.g. the name of the service running the engine.
    pub label: Option<String>,
}

/// `tracing` level names as they appear in config files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Load an engine config from a `.yaml`, `.yml` or `.toml` file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);

    let parse: fn(&str) -> Result<EngineConfig, ConfigError> = match extension.as_deref() {
        Some("yaml") | Some("yml") => |content| Ok(serde_yaml::from_str(content)?),
        Some("toml") => |content| Ok(toml::from_str(content)?),
        _ => {
            return Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
}
