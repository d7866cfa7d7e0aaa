//! Operation definitions and their refusal errors

use std::fmt;
use std::sync::Arc;

use rolegate_engine::{AllowSpec, Rule};

use crate::error::AuthorizationError;
use crate::method::Method;

/// Builds the error surfaced when a call is refused.
///
/// Definitions may override the default; the name stays stable for
/// machine handling while the message is rendered per caller.
#[derive(Clone)]
pub struct PermissionsError {
    name: String,
    message: Arc<dyn Fn(Option<&str>) -> String + Send + Sync>,
}

impl PermissionsError {
    /// A refusal with a custom stable name and message template.
    pub fn new<F>(name: impl Into<String>, message: F) -> Self
    where
        F: Fn(Option<&str>) -> String + Send + Sync + 'static,
    {
        PermissionsError {
            name: name.into(),
            message: Arc::new(message),
        }
    }

    /// The default refusal for a named method.
    pub fn not_allowed(method: impl Into<String>) -> Self {
        let method = method.into();
        PermissionsError::new("MethodGuard.NotAllowed", move |identity| {
            format!(
                "User {} is not allowed to use {}",
                identity.unwrap_or("anonymous"),
                method
            )
        })
    }

    /// The stable error name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renders the refusal for a caller.
    pub fn to_error(&self, identity: Option<&str>) -> AuthorizationError {
        AuthorizationError {
            name: self.name.clone(),
            message: (self.message)(identity),
        }
    }
}

impl fmt::Debug for PermissionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionsError")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// An operation definition: a named handler plus its declared access options.
///
/// Nothing here is validated. `MethodGuard::wrap` is where invalid
/// combinations (both sides declared, empty lists) are rejected, which keeps
/// the definition free to mirror whatever the author wrote.
pub struct MethodDefinition {
    pub(crate) name: String,
    pub(crate) handler: Arc<dyn Method>,
    pub(crate) allow: Option<AllowSpec>,
    pub(crate) deny: Option<Vec<Rule>>,
    pub(crate) permissions_error: Option<PermissionsError>,
}

impl MethodDefinition {
    /// Starts a definition for a named handler.
    pub fn builder(name: impl Into<String>, handler: Arc<dyn Method>) -> MethodDefinitionBuilder {
        MethodDefinitionBuilder {
            definition: MethodDefinition {
                name: name.into(),
                handler,
                allow: None,
                deny: None,
                permissions_error: None,
            },
        }
    }

    /// The method name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Fluent construction of a [`MethodDefinition`].
pub struct MethodDefinitionBuilder {
    definition: MethodDefinition,
}

impl MethodDefinitionBuilder {
    /// Declares allow rules.
    pub fn allow(mut self, rules: Vec<Rule>) -> Self {
        self.definition.allow = Some(AllowSpec::Rules(rules));
        self
    }

    /// Declares the method open to every caller, authenticated or not.
    pub fn allow_anyone(mut self) -> Self {
        self.definition.allow = Some(AllowSpec::Anyone);
        self
    }

    /// Declares deny rules.
    pub fn deny(mut self, rules: Vec<Rule>) -> Self {
        self.definition.deny = Some(rules);
        self
    }

    /// Overrides the refusal error for this method.
    pub fn permissions_error(mut self, error: PermissionsError) -> Self {
        self.definition.permissions_error = Some(error);
        self
    }

    /// Finishes the definition. Validation happens at wrap time.
    pub fn build(self) -> MethodDefinition {
        self.definition
    }
}
