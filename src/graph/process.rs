// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use crate::graph::Node;

/// An immutable process graph: named nodes keyed by id.
///
/// Registering a second node under an existing id replaces the first one and
/// is remembered, so validation can reject the process.
#[derive(Debug, Clone)]
pub struct Process {
    name: String,
    phases: BTreeMap<String, Node>,
    duplicate_ids: Vec<String>,
}

impl Process {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phases: BTreeMap::new(),
            duplicate_ids: Vec::new(),
        }
    }

    pub fn with_node(mut self, node: impl Into<Node>) -> Self {
        self.add_node(node);
        self
    }

    pub fn add_node(&mut self, node: impl Into<Node>) {
        let node = node.into();
        let id = node.id().to_string();
        if self.phases.insert(id.clone(), node).is_some() {
            self.duplicate_ids.push(id);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.phases.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.phases.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.phases.values()
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub(crate) fn duplicate_ids(&self) -> &[String] {
        &self.duplicate_ids
    }
}
