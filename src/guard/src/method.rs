//! The handler contract for guarded methods

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::context::CallContext;
use crate::error::Result;

/// The callable a guard wraps.
///
/// A handler receives the call context and the call arguments and produces
/// the method's result. It runs only after the decision chain permits the
/// call, or through the trusted path.
#[async_trait]
pub trait Method: Send + Sync {
    async fn run(&self, ctx: &CallContext, args: Value) -> Result<Value>;
}

/// Adapts an async closure into a [`Method`].
///
/// The closure takes the context by value so its future owns everything it
/// needs; `CallContext` is two small fields and clones cheaply.
pub struct FnMethod<F> {
    f: F,
}

impl<F> FnMethod<F>
where
    F: Fn(CallContext, Value) -> BoxFuture<'static, Result<Value>> + Send + Sync,
{
    /// Wraps the closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Method for FnMethod<F>
where
    F: Fn(CallContext, Value) -> BoxFuture<'static, Result<Value>> + Send + Sync,
{
    async fn run(&self, ctx: &CallContext, args: Value) -> Result<Value> {
        (self.f)(ctx.clone(), args).await
    }
}
