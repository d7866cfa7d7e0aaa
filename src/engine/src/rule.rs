//! Rule data model: role selectors, scope selectors, and the rules built
//! from them

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{DefinitionError, Result};

/// Selects which roles a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleSpec {
    /// Any role at all; the caller merely has to hold something.
    Any,
    /// A single named role.
    Named(String),
    /// Any one of the listed roles.
    List(Vec<String>),
}

impl From<&str> for RoleSpec {
    fn from(name: &str) -> Self {
        RoleSpec::Named(name.to_string())
    }
}

impl From<String> for RoleSpec {
    fn from(name: String) -> Self {
        RoleSpec::Named(name)
    }
}

impl From<Vec<String>> for RoleSpec {
    fn from(names: Vec<String>) -> Self {
        RoleSpec::List(names)
    }
}

impl From<Vec<&str>> for RoleSpec {
    fn from(names: Vec<&str>) -> Self {
        RoleSpec::List(names.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for RoleSpec {
    fn from(names: &[&str]) -> Self {
        RoleSpec::List(names.iter().map(|name| name.to_string()).collect())
    }
}

/// A scope selector with any computed form already applied.
///
/// This is what the matcher sees; resolution happens once per evaluation in
/// [`ScopeSpec::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedScope {
    /// Any scope the caller holds roles in.
    Any,
    /// A single named scope.
    Named(String),
    /// Any one of the listed scopes.
    List(Vec<String>),
}

impl From<&str> for ResolvedScope {
    fn from(name: &str) -> Self {
        ResolvedScope::Named(name.to_string())
    }
}

impl From<String> for ResolvedScope {
    fn from(name: String) -> Self {
        ResolvedScope::Named(name)
    }
}

impl From<Vec<String>> for ResolvedScope {
    fn from(names: Vec<String>) -> Self {
        ResolvedScope::List(names)
    }
}

impl From<Vec<&str>> for ResolvedScope {
    fn from(names: Vec<&str>) -> Self {
        ResolvedScope::List(names.into_iter().map(String::from).collect())
    }
}

/// A scope computed from the call itself.
///
/// Invoked with the caller identity and the call arguments, exactly once per
/// rule evaluation. Returning [`ResolvedScope`] rather than [`ScopeSpec`]
/// keeps computed scopes from nesting.
pub type ScopeFn = Arc<dyn Fn(Option<&str>, &Value) -> ResolvedScope + Send + Sync>;

/// Selects which scopes a rule applies in.
#[derive(Clone)]
pub enum ScopeSpec {
    /// Any scope; the role check ranges over every scope the caller holds
    /// roles in.
    Any,
    /// A single named scope. Names are opaque and compared for equality.
    Named(String),
    /// Any one of the listed scopes.
    List(Vec<String>),
    /// A scope derived from the caller and the call arguments.
    Computed(ScopeFn),
}

impl ScopeSpec {
    /// Wraps a function as a computed scope selector.
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(Option<&str>, &Value) -> ResolvedScope + Send + Sync + 'static,
    {
        ScopeSpec::Computed(Arc::new(f))
    }

    /// Applies any computed form, yielding the selector the matcher works on.
    pub fn resolve(&self, identity: Option<&str>, args: &Value) -> ResolvedScope {
        match self {
            ScopeSpec::Any => ResolvedScope::Any,
            ScopeSpec::Named(name) => ResolvedScope::Named(name.clone()),
            ScopeSpec::List(names) => ResolvedScope::List(names.clone()),
            ScopeSpec::Computed(f) => f(identity, args),
        }
    }
}

impl fmt::Debug for ScopeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeSpec::Any => write!(f, "Any"),
            ScopeSpec::Named(name) => f.debug_tuple("Named").field(name).finish(),
            ScopeSpec::List(names) => f.debug_tuple("List").field(names).finish(),
            ScopeSpec::Computed(_) => write!(f, "Computed(..)"),
        }
    }
}

impl From<&str> for ScopeSpec {
    fn from(name: &str) -> Self {
        ScopeSpec::Named(name.to_string())
    }
}

impl From<String> for ScopeSpec {
    fn from(name: String) -> Self {
        ScopeSpec::Named(name)
    }
}

impl From<Vec<String>> for ScopeSpec {
    fn from(names: Vec<String>) -> Self {
        ScopeSpec::List(names)
    }
}

impl From<Vec<&str>> for ScopeSpec {
    fn from(names: Vec<&str>) -> Self {
        ScopeSpec::List(names.into_iter().map(String::from).collect())
    }
}

/// A custom check consulted after the role and scope selectors match.
///
/// Receives the caller identity (if any) and the call arguments.
pub type Predicate = Arc<dyn Fn(Option<&str>, &Value) -> bool + Send + Sync>;

/// A single allow or deny rule.
///
/// A rule applies to a call when its role selector and scope selector both
/// match the caller, and its predicate (if present) returns true for the
/// call arguments.
#[derive(Clone)]
pub struct Rule {
    /// Which roles satisfy the rule.
    pub roles: RoleSpec,
    /// Which scopes the roles must be held in.
    pub scope: ScopeSpec,
    /// Optional custom check run after the selectors match.
    pub predicate: Option<Predicate>,
}

impl Rule {
    /// Creates a rule from a role selector and a scope selector.
    pub fn new(roles: impl Into<RoleSpec>, scope: impl Into<ScopeSpec>) -> Self {
        Rule {
            roles: roles.into(),
            scope: scope.into(),
            predicate: None,
        }
    }

    /// The rule satisfied by any authenticated caller, whatever roles and
    /// scopes they hold.
    pub fn logged_in() -> Self {
        Rule::new(RoleSpec::Any, ScopeSpec::Any)
    }

    /// Attaches a custom predicate consulted after the selectors match.
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(Option<&str>, &Value) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Starts an incrementally built rule.
    pub fn builder() -> RuleBuilder {
        RuleBuilder::default()
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("roles", &self.roles)
            .field("scope", &self.scope)
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Incremental [`Rule`] construction with validation.
///
/// Unlike [`Rule::new`], `build` rejects a rule missing either selector.
/// That matters when rules arrive from configuration rather than from code
/// that states both selectors inline.
#[derive(Default)]
pub struct RuleBuilder {
    roles: Option<RoleSpec>,
    scope: Option<ScopeSpec>,
    predicate: Option<Predicate>,
}

impl RuleBuilder {
    /// Sets the role selector.
    pub fn roles(mut self, roles: impl Into<RoleSpec>) -> Self {
        self.roles = Some(roles.into());
        self
    }

    /// Sets the scope selector.
    pub fn scope(mut self, scope: impl Into<ScopeSpec>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Sets the custom predicate.
    pub fn predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(Option<&str>, &Value) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Finishes the rule, rejecting a missing role or scope selector.
    pub fn build(self) -> Result<Rule> {
        let roles = self.roles.ok_or(DefinitionError::MissingRoles)?;
        let scope = self.scope.ok_or(DefinitionError::MissingScope)?;
        Ok(Rule {
            roles,
            scope,
            predicate: self.predicate,
        })
    }
}
