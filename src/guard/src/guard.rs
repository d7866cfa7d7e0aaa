//! The guard factory and guarded methods

use std::sync::Arc;

use rolegate_engine::{AccessPolicy, DecisionEngine, DefinitionError, RoleStore, Verdict};
use serde_json::Value;
use tracing::debug;

use crate::context::CallContext;
use crate::definition::{MethodDefinition, PermissionsError};
use crate::error::Result;
use crate::method::Method;

/// Wraps method definitions against one role store.
///
/// This factory is the only way to obtain a [`GuardedMethod`]. Wrapping
/// validates a definition's access options exactly once, so the run path
/// never re-checks shape.
pub struct MethodGuard {
    store: Arc<dyn RoleStore>,
}

impl MethodGuard {
    /// Creates a factory bound to the given role store.
    pub fn new(store: Arc<dyn RoleStore>) -> Self {
        Self { store }
    }

    /// Validates a definition and binds it to a decision engine.
    pub fn wrap(
        &self,
        definition: MethodDefinition,
    ) -> std::result::Result<GuardedMethod, DefinitionError> {
        let MethodDefinition {
            name,
            handler,
            allow,
            deny,
            permissions_error,
        } = definition;

        let policy = AccessPolicy::from_options(allow, deny)?;
        let permissions_error =
            permissions_error.unwrap_or_else(|| PermissionsError::not_allowed(name.clone()));

        debug!("wrapped method {}", name);
        Ok(GuardedMethod {
            name,
            policy,
            permissions_error,
            handler,
            engine: DecisionEngine::new(Arc::clone(&self.store)),
        })
    }
}

/// A method with its access rules validated and bound.
pub struct GuardedMethod {
    name: String,
    policy: Option<AccessPolicy>,
    permissions_error: PermissionsError,
    handler: Arc<dyn Method>,
    engine: DecisionEngine,
}

impl GuardedMethod {
    /// The method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The policy the definition declared, if any.
    pub fn policy(&self) -> Option<&AccessPolicy> {
        self.policy.as_ref()
    }

    /// The error a refusal will carry, default or overridden.
    pub fn permissions_error(&self) -> &PermissionsError {
        &self.permissions_error
    }

    /// Runs the method for a caller.
    ///
    /// A trusted context bypasses evaluation entirely; this is how trust
    /// propagates into nested guarded calls. Every other context goes through
    /// the decision chain, and a refusal surfaces as
    /// `MethodError::NotAllowed` without the handler ever running.
    pub async fn run(&self, ctx: &CallContext, args: Value) -> Result<Value> {
        if ctx.is_trusted() {
            debug!("running {} through the trusted path", self.name);
            return self.handler.run(ctx, args).await;
        }

        match self
            .engine
            .decide(self.policy.as_ref(), ctx.identity(), &args)
            .await
        {
            Verdict::Permit => self.handler.run(ctx, args).await,
            _ => {
                let error = self.permissions_error.to_error(ctx.identity());
                debug!("refused {} for {}", self.name, ctx.identity().unwrap_or("anonymous"));
                Err(error.into())
            }
        }
    }

    /// Runs the method with rule evaluation bypassed.
    ///
    /// The handler receives a trusted, identity-less context. This is the
    /// server-side escape hatch for internal calls; the definition's rules,
    /// or their absence, are irrelevant here.
    pub async fn run_trusted(&self, args: Value) -> Result<Value> {
        debug!("running {} trusted", self.name);
        self.handler.run(&CallContext::trusted(), args).await
    }
}
