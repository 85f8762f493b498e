// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Static defects found in a process definition before any node runs.
///
/// Every variant can report the coordinates of the offending element as a
/// path from the process root (see [`ValidationError::coordinates`]).
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The process has no name
    EmptyProcessName,
    /// The process contains no nodes at all
    EmptyProcess {
        /// The name of the empty process
        process: String,
    },
    /// A node was registered with an empty id
    EmptyNodeId,
    /// Two nodes were registered under the same id
    DuplicateNodeId {
        /// The duplicated node id
        node_id: String,
    },
    /// A node's static `next` is an empty connection or decision list
    EmptyNext {
        /// The node owning the empty list
        node_id: String,
    },
    /// A transition under a node's `next` has an empty id
    EmptyTransitionId {
        /// The node owning the transition
        node_id: String,
        /// Position of the transition in the node's `next`
        index: usize,
    },
    /// Two transitions under the same node share an id
    DuplicateTransitionId {
        /// The node owning the transitions
        node_id: String,
        /// The duplicated transition id
        transition_id: String,
    },
    /// A connection targets a node id that does not exist in the process
    DanglingConnection {
        /// The node owning the connection
        node_id: String,
        /// The offending connection
        connection_id: String,
        /// The missing target
        target_node_id: String,
    },
    /// The beginning transition has an empty id
    EmptyBeginningId,
    /// The beginning transition targets a node id that does not exist
    MissingBeginningTarget {
        /// The beginning transition
        beginning_id: String,
        /// The missing target
        target_node_id: String,
    },
}

impl ValidationError {
    /// Path from the process root to the element this error is about.
    pub fn coordinates(&self) -> Vec<String> {
        match self {
            ValidationError::EmptyProcessName => vec!["name".to_string()],
            ValidationError::EmptyProcess { .. } => vec!["phases".to_string()],
            ValidationError::EmptyNodeId => vec!["phases".to_string(), String::new()],
            ValidationError::DuplicateNodeId { node_id } => {
                vec!["phases".to_string(), node_id.clone()]
            }
            ValidationError::EmptyNext { node_id } => {
                vec!["phases".to_string(), node_id.clone(), "next".to_string()]
            }
            ValidationError::EmptyTransitionId { node_id, index } => vec![
                "phases".to_string(),
                node_id.clone(),
                "next".to_string(),
                index.to_string(),
            ],
            ValidationError::DuplicateTransitionId {
                node_id,
                transition_id,
            } => vec![
                "phases".to_string(),
                node_id.clone(),
                "next".to_string(),
                transition_id.clone(),
            ],
            ValidationError::DanglingConnection {
                node_id,
                connection_id,
                ..
            } => vec![
                "phases".to_string(),
                node_id.clone(),
                "next".to_string(),
                connection_id.clone(),
                "target_node_id".to_string(),
            ],
            ValidationError::EmptyBeginningId => {
                vec!["beginning".to_string(), "id".to_string()]
            }
            ValidationError::MissingBeginningTarget { .. } => {
                vec!["beginning".to_string(), "target_node_id".to_string()]
            }
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyProcessName => write!(f, "Process name must not be empty"),
            ValidationError::EmptyProcess { process } => {
                write!(f, "Process '{}' does not contain any nodes", process)
            }
            ValidationError::EmptyNodeId => write!(f, "Node id must not be empty"),
            ValidationError::DuplicateNodeId { node_id } => {
                write!(f, "Duplicate node ID: '{}'", node_id)
            }
            ValidationError::EmptyNext { node_id } => write!(
                f,
                "Node '{}' declares an empty next; omit next to terminate implicitly",
                node_id
            ),
            ValidationError::EmptyTransitionId { node_id, index } => write!(
                f,
                "Transition #{} of node '{}' has an empty id",
                index, node_id
            ),
            ValidationError::DuplicateTransitionId {
                node_id,
                transition_id,
            } => write!(
                f,
                "Node '{}' declares transition '{}' more than once",
                node_id, transition_id
            ),
            ValidationError::DanglingConnection {
                node_id,
                connection_id,
                target_node_id,
            } => write!(
                f,
                "Connection '{}' of node '{}' targets '{}' which does not exist",
                connection_id, node_id, target_node_id
            ),
            ValidationError::EmptyBeginningId => write!(f, "Beginning id must not be empty"),
            ValidationError::MissingBeginningTarget {
                beginning_id,
                target_node_id,
            } => write!(
                f,
                "Beginning '{}' targets '{}' which does not exist",
                beginning_id, target_node_id
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dangling_connection_reports_path_to_target() {
        let error = ValidationError::DanglingConnection {
            node_id: "a".to_string(),
            connection_id: "a-to-x".to_string(),
            target_node_id: "x".to_string(),
        };

        assert_eq!(
            error.coordinates(),
            vec!["phases", "a", "next", "a-to-x", "target_node_id"]
        );
        assert_eq!(
            error.to_string(),
            "Connection 'a-to-x' of node 'a' targets 'x' which does not exist"
        );
    }

    #[test]
    fn test_empty_transition_id_uses_position() {
        let error = ValidationError::EmptyTransitionId {
            node_id: "b".to_string(),
            index: 2,
        };
        assert_eq!(error.coordinates(), vec!["phases", "b", "next", "2"]);
    }
}
