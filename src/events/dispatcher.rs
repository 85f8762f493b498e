// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::events::Event;
use crate::traits::Observer;

/// Fans an event out to every registered observer, in registration order.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    observers: Vec<Arc<dyn Observer>>,
}

impl EventDispatcher {
    pub fn new(observers: Vec<Arc<dyn Observer>>) -> Self {
        Self { observers }
    }

    pub fn register(&mut self, observer: Arc<dyn Observer>) {
        self.observers.push(observer);
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub async fn dispatch(&self, event: &Event) {
        for observer in &self.observers {
            observer.on_event(event).await;
        }
    }

    /// Build and dispatch an event only when someone is listening.
    pub async fn emit<F>(&self, build: F)
    where
        F: FnOnce() -> Event,
    {
        if self.observers.is_empty() {
            return;
        }
        let event = build();
        self.dispatch(&event).await;
    }
}
