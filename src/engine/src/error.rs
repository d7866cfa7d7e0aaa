//! Error types for rule and policy construction

use thiserror::Error;

/// Rejections raised while building rules and policies.
///
/// These are programming errors in the method definition, caught once at
/// construction time. Nothing here is produced while evaluating a call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DefinitionError {
    /// A definition declared both allow and deny rules
    #[error("A method cannot declare both allow and deny rules")]
    AllowAndDeny,

    /// A declared rule list was empty
    #[error("The {list} list must contain at least one rule")]
    EmptyRuleList { list: &'static str },

    /// A rule was built without a role selector
    #[error("Rule is missing a role selector")]
    MissingRoles,

    /// A rule was built without a scope selector
    #[error("Rule is missing a scope selector")]
    MissingScope,
}

/// Result type for definition-time operations
pub type Result<T> = std::result::Result<T, DefinitionError>;
