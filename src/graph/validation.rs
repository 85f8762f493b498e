// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Static validation of process graphs.
//!
//! Validation runs once at the start of every run, before any node executes.
//! Checks are grouped into small passes that each append to a shared error
//! list, so a caller sees every defect at once instead of fixing them one at
//! a time:
//!
//! 1. **Shape**: the process has a name and at least one node, every node has
//!    an id and no id was registered twice.
//! 2. **Transitions**: no static `next` is empty and transition ids under one
//!    node are present and unique.
//! 3. **References**: every static connection targets an existing node.
//!
//! Decisions compute their destinations at run time, so their targets cannot
//! be checked here.
//!
//! # Example
//! ```rust
//! use phaseflow::errors::ValidationError;
//! use phaseflow::graph::{validate_process, Connection, PhaseNode, Process};
//!
//! let process = Process::new("broken").with_node(
//!     PhaseNode::from_fn("a", |input| async move { anyhow::Ok(input) })
//!         .with_next(Connection::new("a-to-b", "b")),
//! );
//!
//! let errors = validate_process(&process).unwrap_err();
//! assert_eq!(
//!     errors,
//!     vec![ValidationError::DanglingConnection {
//!         node_id: "a".to_string(),
//!         connection_id: "a-to-b".to_string(),
//!         target_node_id: "b".to_string(),
//!     }]
//! );
//! ```

use std::collections::HashSet;

use crate::errors::ValidationError;
use crate::graph::{Beginning, Next, Process};

/// Validate the whole process, returning every defect found.
pub fn validate_process(process: &Process) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_shape(process, &mut errors);
    validate_transitions(process, &mut errors);
    validate_connection_targets(process, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate that a beginning can start the given process.
pub fn validate_beginning(
    beginning: &Beginning,
    process: &Process,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if beginning.id.is_empty() {
        errors.push(ValidationError::EmptyBeginningId);
    }
    if !process.contains(&beginning.target_node_id) {
        errors.push(ValidationError::MissingBeginningTarget {
            beginning_id: beginning.id.clone(),
            target_node_id: beginning.target_node_id.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_shape(process: &Process, errors: &mut Vec<ValidationError>) {
    if process.name().is_empty() {
        errors.push(ValidationError::EmptyProcessName);
    }
    if process.is_empty() {
        errors.push(ValidationError::EmptyProcess {
            process: process.name().to_string(),
        });
    }
    if process.contains("") {
        errors.push(ValidationError::EmptyNodeId);
    }

    let mut reported = HashSet::new();
    for node_id in process.duplicate_ids() {
        if reported.insert(node_id.as_str()) {
            errors.push(ValidationError::DuplicateNodeId {
                node_id: node_id.clone(),
            });
        }
    }
}

fn validate_transitions(process: &Process, errors: &mut Vec<ValidationError>) {
    for node in process.nodes() {
        let Some(next) = node.next() else {
            continue;
        };

        if next.is_empty() {
            errors.push(ValidationError::EmptyNext {
                node_id: node.id().to_string(),
            });
            continue;
        }

        let mut seen = HashSet::new();
        for (index, transition_id) in next.transition_ids().into_iter().enumerate() {
            if transition_id.is_empty() {
                errors.push(ValidationError::EmptyTransitionId {
                    node_id: node.id().to_string(),
                    index,
                });
            } else if !seen.insert(transition_id) {
                errors.push(ValidationError::DuplicateTransitionId {
                    node_id: node.id().to_string(),
                    transition_id: transition_id.to_string(),
                });
            }
        }
    }
}

fn validate_connection_targets(process: &Process, errors: &mut Vec<ValidationError>) {
    for node in process.nodes() {
        if let Some(Next::Connections(connections)) = node.next() {
            for connection in connections {
                if !process.contains(&connection.target_node_id) {
                    errors.push(ValidationError::DanglingConnection {
                        node_id: node.id().to_string(),
                        connection_id: connection.id.clone(),
                        target_node_id: connection.target_node_id.clone(),
                    });
                }
            }
        }
    }
}
