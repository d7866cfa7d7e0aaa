//! Error types for guarded method execution

use serde::Serialize;
use thiserror::Error;

/// A refused call.
///
/// Carries the stable error name and the rendered message from the
/// definition's permissions error, so a transport can surface both to the
/// caller.
#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
#[error("{message}")]
pub struct AuthorizationError {
    /// Stable, machine-readable error name.
    pub name: String,
    /// Human-readable refusal message.
    pub message: String,
}

/// Errors surfaced by guarded methods and the registry
#[derive(Debug, Error)]
pub enum MethodError {
    /// The caller was refused by the method's access rules
    #[error(transparent)]
    NotAllowed(#[from] AuthorizationError),

    /// No method registered under the given name
    #[error("Method not found: {0}")]
    NotFound(String),

    /// A method with the same name is already registered
    #[error("Method already registered: {0}")]
    AlreadyRegistered(String),

    /// The handler itself failed
    #[error("Method failed: {0}")]
    Failed(String),
}

/// Result type for guarded method operations
pub type Result<T> = std::result::Result<T, MethodError>;
