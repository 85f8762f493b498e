// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::events::Event;

/// Receives lifecycle events from a running process.
///
/// The engine awaits each observer in registration order at every dispatch
/// site, so a slow observer slows the branch that emitted the event but not
/// its siblings.
#[async_trait]
pub trait Observer: Send + Sync {
    async fn on_event(&self, event: &Event);
}
