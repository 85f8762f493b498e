// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Callbacks attached to transitions.
//!
//! Each trait has a closure adapter (`Fn*`) for the common case where the hook
//! is a plain synchronous function. Every hook runs while the engine holds the
//! run context.

use async_trait::async_trait;

use crate::graph::{Context, DecisionOutcome, Input, Output};

/// Rewrites a node's output into the next node's input along a connection.
///
/// Context changes are discarded if the transform fails.
#[async_trait]
pub trait Transform: Send + Sync {
    async fn transform(&self, output: &Output, context: &mut Context) -> anyhow::Result<Input>;
}

/// Picks the route a node's output takes at run time.
///
/// A decision may record what it chose in the context; the write is visible
/// to every node scheduled afterwards.
#[async_trait]
pub trait Decide: Send + Sync {
    async fn decide(&self, output: &Output, context: &mut Context) -> anyhow::Result<DecisionOutcome>;
}

/// Side-effecting finalizer run when a path terminates.
///
/// The returned value is informational only; the recorded result is always
/// the output that reached the termination.
#[async_trait]
pub trait Terminate: Send + Sync {
    async fn terminate(&self, output: &Output, context: &mut Context) -> anyhow::Result<Output>;
}

/// Produces the first input of a run from the caller's input.
#[async_trait]
pub trait Begin: Send + Sync {
    async fn begin(&self, input: Input, context: &mut Context) -> anyhow::Result<Input>;
}

pub struct FnTransform<F>(F);

impl<F> FnTransform<F>
where
    F: Fn(&Output, &mut Context) -> anyhow::Result<Input> + Send + Sync,
{
    pub fn new(transform: F) -> Self {
        Self(transform)
    }
}

#[async_trait]
impl<F> Transform for FnTransform<F>
where
    F: Fn(&Output, &mut Context) -> anyhow::Result<Input> + Send + Sync,
{
    async fn transform(&self, output: &Output, context: &mut Context) -> anyhow::Result<Input> {
        (self.0)(output, context)
    }
}

pub struct FnDecide<F>(F);

impl<F> FnDecide<F>
where
    F: Fn(&Output, &mut Context) -> anyhow::Result<DecisionOutcome> + Send + Sync,
{
    pub fn new(decide: F) -> Self {
        Self(decide)
    }
}

#[async_trait]
impl<F> Decide for FnDecide<F>
where
    F: Fn(&Output, &mut Context) -> anyhow::Result<DecisionOutcome> + Send + Sync,
{
    async fn decide(&self, output: &Output, context: &mut Context) -> anyhow::Result<DecisionOutcome> {
        (self.0)(output, context)
    }
}

pub struct FnTerminate<F>(F);

impl<F> FnTerminate<F>
where
    F: Fn(&Output, &mut Context) -> anyhow::Result<Output> + Send + Sync,
{
    pub fn new(terminate: F) -> Self {
        Self(terminate)
    }
}

#[async_trait]
impl<F> Terminate for FnTerminate<F>
where
    F: Fn(&Output, &mut Context) -> anyhow::Result<Output> + Send + Sync,
{
    async fn terminate(&self, output: &Output, context: &mut Context) -> anyhow::Result<Output> {
        (self.0)(output, context)
    }
}

pub struct FnBegin<F>(F);

impl<F> FnBegin<F>
where
    F: Fn(Input, &mut Context) -> anyhow::Result<Input> + Send + Sync,
{
    pub fn new(begin: F) -> Self {
        Self(begin)
    }
}

#[async_trait]
impl<F> Begin for FnBegin<F>
where
    F: Fn(Input, &mut Context) -> anyhow::Result<Input> + Send + Sync,
{
    async fn begin(&self, input: Input, context: &mut Context) -> anyhow::Result<Input> {
        (self.0)(input, context)
    }
}
