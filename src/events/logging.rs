// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::Level;

use crate::events::Event;
use crate::traits::Observer;

/// Renders an event into the message line of a log record.
pub type EventFormatter = Arc<dyn Fn(&Event) -> String + Send + Sync>;

/// Writes every event to `tracing` at a fixed level.
///
/// The message is the event's `Display` form unless a formatter is set, and is
/// prefixed with `[label]` when a label is set. Payload values, including the
/// context snapshot on process events, are rendered as compact JSON in the
/// `payload` field.
#[derive(Clone)]
pub struct LoggingObserver {
    level: Level,
    label: Option<String>,
    formatter: Option<EventFormatter>,
}

impl LoggingObserver {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            label: None,
            formatter: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&Event) -> String + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The message line logged for `event`.
    pub fn render(&self, event: &Event) -> String {
        let message = match &self.formatter {
            Some(formatter) => formatter(event),
            None => event.to_string(),
        };
        match &self.label {
            Some(label) => format!("[{}] {}", label, message),
            None => message,
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new(Level::DEBUG)
    }
}

impl fmt::Debug for LoggingObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingObserver")
            .field("level", &self.level)
            .field("label", &self.label)
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}

macro_rules! event_at {
    ($level:expr, $($field:tt)+) => {
        if $level == Level::ERROR {
            tracing::error!($($field)+)
        } else if $level == Level::WARN {
            tracing::warn!($($field)+)
        } else if $level == Level::INFO {
            tracing::info!($($field)+)
        } else if $level == Level::DEBUG {
            tracing::debug!($($field)+)
        } else {
            tracing::trace!($($field)+)
        }
    };
}

#[async_trait]
impl Observer for LoggingObserver {
    async fn on_event(&self, event: &Event) {
        let payload = serde_json::to_string(&event.payload).unwrap_or_default();
        let transition_id = event.transition_id.as_deref().unwrap_or("");
        let message = self.render(event);
        event_at!(
            self.level,
            category = %event.category,
            stage = %event.stage,
            source_id = event.source_id.as_str(),
            transition_id,
            payload = payload.as_str(),
            "{}", message
        );
    }
}
