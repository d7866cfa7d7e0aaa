//! The role store contract and an in-memory implementation

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Read-only queries against the surrounding system's role assignments.
///
/// Queries are infallible: an unknown identity simply holds no roles and no
/// scopes. Scope names are opaque strings compared for equality; the engine
/// attaches no meaning to any particular name.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Role names the identity holds within the given scope.
    async fn roles_of(&self, identity: &str, scope: &str) -> HashSet<String>;

    /// All scopes in which the identity holds at least one role.
    async fn scopes_of(&self, identity: &str) -> HashSet<String>;

    /// Whether the identity holds any of the given roles within the scope.
    async fn has_role(&self, identity: &str, roles: &[String], scope: &str) -> bool {
        let held = self.roles_of(identity, scope).await;
        roles.iter().any(|role| held.contains(role))
    }
}

/// Role assignments held in process memory.
///
/// Suits tests and embedders without an external role system. Assignments
/// nest identity, then scope, then the set of role names.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoleStore {
    grants: Arc<RwLock<HashMap<String, HashMap<String, HashSet<String>>>>>,
}

impl InMemoryRoleStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds roles for an identity within a scope.
    pub async fn assign(&self, identity: &str, roles: &[&str], scope: &str) {
        let mut grants = self.grants.write().await;
        let scopes = grants.entry(identity.to_string()).or_default();
        let held = scopes.entry(scope.to_string()).or_default();
        held.extend(roles.iter().map(|role| role.to_string()));
    }

    /// Removes a role from an identity within a scope. Empty scope entries
    /// are dropped so `scopes_of` never reports a scope without roles.
    pub async fn revoke(&self, identity: &str, role: &str, scope: &str) {
        let mut grants = self.grants.write().await;
        if let Some(scopes) = grants.get_mut(identity) {
            if let Some(held) = scopes.get_mut(scope) {
                held.remove(role);
                if held.is_empty() {
                    scopes.remove(scope);
                }
            }
        }
    }
}

#[async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn roles_of(&self, identity: &str, scope: &str) -> HashSet<String> {
        let grants = self.grants.read().await;
        grants
            .get(identity)
            .and_then(|scopes| scopes.get(scope))
            .cloned()
            .unwrap_or_default()
    }

    async fn scopes_of(&self, identity: &str) -> HashSet<String> {
        let grants = self.grants.read().await;
        grants
            .get(identity)
            .map(|scopes| scopes.keys().cloned().collect())
            .unwrap_or_default()
    }
}
