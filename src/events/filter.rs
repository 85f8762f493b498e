// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::events::{Event, EventCategory, Stage};
use crate::traits::Observer;

/// Selects events by category and stage. An unset dimension matches everything.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    categories: Option<HashSet<EventCategory>>,
    stages: Option<HashSet<Stage>>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn categories(mut self, categories: impl IntoIterator<Item = EventCategory>) -> Self {
        self.categories = Some(categories.into_iter().collect());
        self
    }

    pub fn stages(mut self, stages: impl IntoIterator<Item = Stage>) -> Self {
        self.stages = Some(stages.into_iter().collect());
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        let category_matches = self
            .categories
            .as_ref()
            .map_or(true, |categories| categories.contains(&event.category));
        let stage_matches = self
            .stages
            .as_ref()
            .map_or(true, |stages| stages.contains(&event.stage));
        category_matches && stage_matches
    }
}

/// Forwards only the events accepted by its filter.
pub struct FilteredObserver {
    filter: EventFilter,
    inner: Arc<dyn Observer>,
}

impl FilteredObserver {
    pub fn new(filter: EventFilter, inner: Arc<dyn Observer>) -> Self {
        Self { filter, inner }
    }
}

#[async_trait]
impl Observer for FilteredObserver {
    async fn on_event(&self, event: &Event) {
        if self.filter.matches(event) {
            self.inner.on_event(event).await;
        }
    }
}
