//! Named dispatch over guarded methods

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::context::CallContext;
use crate::error::{MethodError, Result};
use crate::guard::GuardedMethod;

/// Holds guarded methods under their names and dispatches calls to them.
#[derive(Clone, Default)]
pub struct MethodRegistry {
    methods: Arc<RwLock<HashMap<String, Arc<GuardedMethod>>>>,
}

impl MethodRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a guarded method under its name.
    pub async fn register(&self, method: GuardedMethod) -> Result<()> {
        let mut methods = self.methods.write().await;
        let name = method.name().to_string();
        if methods.contains_key(&name) {
            return Err(MethodError::AlreadyRegistered(name));
        }
        debug!("registered method {}", name);
        methods.insert(name, Arc::new(method));
        Ok(())
    }

    /// Removes a method by name.
    pub async fn unregister(&self, name: &str) -> Result<()> {
        let mut methods = self.methods.write().await;
        methods
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| MethodError::NotFound(name.to_string()))
    }

    /// Dispatches a call through the named method's guard.
    pub async fn call(&self, name: &str, ctx: &CallContext, args: Value) -> Result<Value> {
        // Resolve under the read lock, run without it.
        let method = self.get(name).await?;
        method.run(ctx, args).await
    }

    /// Dispatches a call through the named method's trusted path.
    pub async fn call_trusted(&self, name: &str, args: Value) -> Result<Value> {
        let method = self.get(name).await?;
        method.run_trusted(args).await
    }

    /// Whether a method is registered under the name.
    pub async fn contains(&self, name: &str) -> bool {
        self.methods.read().await.contains_key(name)
    }

    /// Names of all registered methods.
    pub async fn names(&self) -> Vec<String> {
        self.methods.read().await.keys().cloned().collect()
    }

    /// Number of registered methods.
    pub async fn count(&self) -> usize {
        self.methods.read().await.len()
    }

    async fn get(&self, name: &str) -> Result<Arc<GuardedMethod>> {
        let methods = self.methods.read().await;
        methods
            .get(name)
            .cloned()
            .ok_or_else(|| MethodError::NotFound(name.to_string()))
    }
}
