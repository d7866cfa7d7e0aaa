//! Verdicts and the decision engine

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::policy::AccessPolicy;
use crate::rule::{ResolvedScope, RoleSpec, Rule};
use crate::store::RoleStore;

/// Outcome of evaluating one side of a policy, or of the whole chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// The evaluated rules grant the call.
    Permit,
    /// The evaluated rules reject the call.
    Refuse,
    /// The evaluated rules render no verdict: the side is absent, or (for a
    /// deny side) the caller is anonymous.
    Indeterminate,
}

impl Verdict {
    /// Whether this verdict lets the call proceed.
    pub fn is_permit(&self) -> bool {
        matches!(self, Verdict::Permit)
    }
}

/// Evaluates access policies against a role store.
///
/// The engine holds nothing but the store handle. No state is carried from
/// one evaluation to the next, so a single instance serves concurrent calls.
pub struct DecisionEngine {
    store: Arc<dyn RoleStore>,
}

impl DecisionEngine {
    /// Creates an engine backed by the given role store.
    pub fn new(store: Arc<dyn RoleStore>) -> Self {
        Self { store }
    }

    /// The role store this engine queries.
    pub fn store(&self) -> Arc<dyn RoleStore> {
        Arc::clone(&self.store)
    }

    /// Whether the caller satisfies a role selector within a resolved scope
    /// selector.
    ///
    /// Anonymous callers satisfy no combination. List selectors match when
    /// any element matches, and the walk stops at the first hit, so rule
    /// order inside a list never affects the outcome, only the work done.
    pub async fn role_and_scope_match(
        &self,
        identity: Option<&str>,
        roles: &RoleSpec,
        scope: &ResolvedScope,
    ) -> bool {
        let Some(user) = identity else {
            return false;
        };

        match (roles, scope) {
            (RoleSpec::Any, ResolvedScope::Any) => true,
            (RoleSpec::Any, ResolvedScope::Named(s)) => self.holds_any_role(user, s).await,
            (RoleSpec::Any, ResolvedScope::List(scopes)) => {
                for s in scopes {
                    if self.holds_any_role(user, s).await {
                        return true;
                    }
                }
                false
            }
            (RoleSpec::Named(r), ResolvedScope::Any) => {
                self.holds_in_some_scope(user, std::slice::from_ref(r)).await
            }
            (RoleSpec::Named(r), ResolvedScope::Named(s)) => {
                self.store.has_role(user, std::slice::from_ref(r), s).await
            }
            (RoleSpec::Named(r), ResolvedScope::List(scopes)) => {
                self.holds_in_listed_scope(user, std::slice::from_ref(r), scopes)
                    .await
            }
            (RoleSpec::List(rs), ResolvedScope::Any) => self.holds_in_some_scope(user, rs).await,
            (RoleSpec::List(rs), ResolvedScope::Named(s)) => {
                self.store.has_role(user, rs, s).await
            }
            (RoleSpec::List(rs), ResolvedScope::List(scopes)) => {
                self.holds_in_listed_scope(user, rs, scopes).await
            }
        }
    }

    async fn holds_any_role(&self, user: &str, scope: &str) -> bool {
        !self.store.roles_of(user, scope).await.is_empty()
    }

    async fn holds_in_some_scope(&self, user: &str, roles: &[String]) -> bool {
        for scope in self.store.scopes_of(user).await {
            if self.store.has_role(user, roles, &scope).await {
                return true;
            }
        }
        false
    }

    async fn holds_in_listed_scope(&self, user: &str, roles: &[String], scopes: &[String]) -> bool {
        for scope in scopes {
            if self.store.has_role(user, roles, scope).await {
                return true;
            }
        }
        false
    }

    /// Whether a single rule applies to the call.
    ///
    /// Resolves any computed scope exactly once, checks the selectors, then
    /// consults the predicate. The predicate never runs when the selectors
    /// do not match.
    pub async fn evaluate_rule(&self, rule: &Rule, identity: Option<&str>, args: &Value) -> bool {
        let scope = rule.scope.resolve(identity, args);
        if !self.role_and_scope_match(identity, &rule.roles, &scope).await {
            return false;
        }
        match &rule.predicate {
            Some(predicate) => predicate(identity, args),
            None => true,
        }
    }

    /// Evaluates the allow side of a policy.
    ///
    /// `Indeterminate` means the definition carries no allow rules. A present
    /// allow list that no rule satisfies is an outright `Refuse`, not a
    /// deferral to the deny side.
    pub async fn is_allowed(
        &self,
        policy: Option<&AccessPolicy>,
        identity: Option<&str>,
        args: &Value,
    ) -> Verdict {
        let rules = match policy {
            Some(AccessPolicy::AllowAnyone) => return Verdict::Permit,
            Some(AccessPolicy::Allow(rules)) => rules,
            Some(AccessPolicy::Deny(_)) | None => return Verdict::Indeterminate,
        };

        for (index, rule) in rules.iter().enumerate() {
            if self.evaluate_rule(rule, identity, args).await {
                debug!("allow rule {} matched", index);
                return Verdict::Permit;
            }
        }
        Verdict::Refuse
    }

    /// Evaluates the deny side of a policy.
    ///
    /// `Indeterminate` means the definition carries no deny rules, or the
    /// caller is anonymous. Anonymous callers are never deny-checked; they
    /// fall through to the chain's terminal refusal. A matching deny rule is
    /// a `Refuse`; a fully traversed deny list is a `Permit`.
    pub async fn is_denied(
        &self,
        policy: Option<&AccessPolicy>,
        identity: Option<&str>,
        args: &Value,
    ) -> Verdict {
        let rules = match policy {
            Some(AccessPolicy::Deny(rules)) => rules,
            Some(AccessPolicy::AllowAnyone) | Some(AccessPolicy::Allow(_)) | None => {
                return Verdict::Indeterminate
            }
        };
        if identity.is_none() {
            return Verdict::Indeterminate;
        }

        for (index, rule) in rules.iter().enumerate() {
            if self.evaluate_rule(rule, identity, args).await {
                debug!("deny rule {} matched", index);
                return Verdict::Refuse;
            }
        }
        Verdict::Permit
    }

    /// Runs the untrusted decision chain: the allow side, then the deny side,
    /// then the terminal refusal. Always collapses to `Permit` or `Refuse`.
    pub async fn decide(
        &self,
        policy: Option<&AccessPolicy>,
        identity: Option<&str>,
        args: &Value,
    ) -> Verdict {
        let verdict = match self.is_allowed(policy, identity, args).await {
            Verdict::Permit => Verdict::Permit,
            Verdict::Refuse => Verdict::Refuse,
            Verdict::Indeterminate => match self.is_denied(policy, identity, args).await {
                Verdict::Permit => Verdict::Permit,
                Verdict::Refuse | Verdict::Indeterminate => Verdict::Refuse,
            },
        };
        debug!(
            "decision for {}: {:?}",
            identity.unwrap_or("anonymous"),
            verdict
        );
        verdict
    }
}
