// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::{Map, Value};

/// Value handed to a node.
pub type Input = Value;

/// Value a node produces.
pub type Output = Value;

/// Run-wide shared state visible to every hook of one run.
pub type Context = Map<String, Value>;
