// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::graph::{Context, Input, Output};

/// Result of feeding one input to an aggregator.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    /// Enough inputs have arrived; release the join with this output.
    Ready(Output),
    /// Keep waiting for more inputs.
    NotYetReady,
}

/// Folds the inputs of converging branches into a single output.
///
/// Readiness is decided entirely by the implementation. Accumulated state must
/// be kept in `context`; an aggregator value may be shared between runs.
#[async_trait]
pub trait Aggregator: Send + Sync {
    fn name(&self) -> &str;

    async fn aggregate(&self, input: Input, context: &mut Context) -> anyhow::Result<Aggregation>;
}

/// Adapts a closure into an [`Aggregator`].
pub struct FnAggregator<F> {
    name: String,
    aggregate: F,
}

impl<F> FnAggregator<F>
where
    F: Fn(Input, &mut Context) -> anyhow::Result<Aggregation> + Send + Sync,
{
    pub fn new(name: impl Into<String>, aggregate: F) -> Self {
        Self {
            name: name.into(),
            aggregate,
        }
    }
}

#[async_trait]
impl<F> Aggregator for FnAggregator<F>
where
    F: Fn(Input, &mut Context) -> anyhow::Result<Aggregation> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn aggregate(&self, input: Input, context: &mut Context) -> anyhow::Result<Aggregation> {
        (self.aggregate)(input, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fn_aggregator_keeps_state_in_context() {
        let counter = FnAggregator::new("pair", |input: Input, context: &mut Context| {
            let seen = context
                .entry("pair.seen")
                .or_insert_with(|| json!([]))
                .as_array_mut()
                .ok_or_else(|| anyhow::anyhow!("pair.seen is not an array"))?;
            seen.push(input);
            if seen.len() == 2 {
                Ok(Aggregation::Ready(serde_json::Value::Array(seen.clone())))
            } else {
                Ok(Aggregation::NotYetReady)
            }
        });

        let mut context = Context::new();
        let first = counter.aggregate(json!(1), &mut context).await.unwrap();
        let second = counter.aggregate(json!(2), &mut context).await.unwrap();

        assert_eq!(first, Aggregation::NotYetReady);
        assert_eq!(second, Aggregation::Ready(json!([1, 2])));
        assert_eq!(counter.name(), "pair");
    }
}
