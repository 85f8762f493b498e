// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::future::Future;

use async_trait::async_trait;

use crate::graph::{Context, Input, Output};

/// Outcome of a phase's precondition check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub verified: bool,
    pub messages: Vec<String>,
}

impl Verification {
    pub fn passed() -> Self {
        Self {
            verified: true,
            messages: Vec::new(),
        }
    }

    pub fn failed<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            verified: false,
            messages: messages.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for Verification {
    fn default() -> Self {
        Self::passed()
    }
}

/// A unit of computation run once per input by a phase node.
///
/// The engine calls the methods in this order:
/// `prepare` → `verify` → `execute` → `process`.
/// `prepare` and `process` run while the engine holds the run context, so
/// their context mutations are applied atomically.
#[async_trait]
pub trait Phase: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self, input: Input) -> anyhow::Result<Output>;

    async fn verify(&self, _input: &Input) -> Verification {
        Verification::passed()
    }

    async fn prepare(&self, input: Input, _context: &mut Context) -> anyhow::Result<Input> {
        Ok(input)
    }

    async fn process(&self, output: Output, _context: &mut Context) -> anyhow::Result<Output> {
        Ok(output)
    }
}

/// Adapts an async closure into a [`Phase`] with no hooks.
///
/// ```
/// use phaseflow::traits::{FnPhase, Phase};
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let double = FnPhase::new("double", |input: serde_json::Value| async move {
///     let value = input["value"].as_i64().unwrap_or_default();
///     anyhow::Ok(json!({ "value": value * 2 }))
/// });
///
/// let output = double.execute(json!({ "value": 4 })).await.unwrap();
/// assert_eq!(output, json!({ "value": 8 }));
/// # }
/// ```
pub struct FnPhase<F> {
    name: String,
    execute: F,
}

impl<F, Fut> FnPhase<F>
where
    F: Fn(Input) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Output>> + Send,
{
    pub fn new(name: impl Into<String>, execute: F) -> Self {
        Self {
            name: name.into(),
            execute,
        }
    }
}

#[async_trait]
impl<F, Fut> Phase for FnPhase<F>
where
    F: Fn(Input) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Output>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, input: Input) -> anyhow::Result<Output> {
        (self.execute)(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Guarded;

    #[async_trait]
    impl Phase for Guarded {
        fn name(&self) -> &str {
            "guarded"
        }

        async fn execute(&self, input: Input) -> anyhow::Result<Output> {
            Ok(input)
        }

        async fn verify(&self, input: &Input) -> Verification {
            if input.get("value").is_some() {
                Verification::passed()
            } else {
                Verification::failed(["value is required"])
            }
        }
    }

    #[tokio::test]
    async fn test_default_hooks_pass_values_through() {
        let phase = FnPhase::new("identity", |input: Input| async move { anyhow::Ok(input) });
        let mut context = Context::new();

        let prepared = phase.prepare(json!({"a": 1}), &mut context).await.unwrap();
        let processed = phase.process(json!({"b": 2}), &mut context).await.unwrap();

        assert_eq!(prepared, json!({"a": 1}));
        assert_eq!(processed, json!({"b": 2}));
        assert!(context.is_empty());
        assert!(phase.verify(&json!(null)).await.verified);
    }

    #[tokio::test]
    async fn test_custom_verify_reports_messages() {
        let verification = Guarded.verify(&json!({})).await;
        assert!(!verification.verified);
        assert_eq!(verification.messages, vec!["value is required"]);
    }
}
