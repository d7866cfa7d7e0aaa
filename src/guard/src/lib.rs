//! # Rolegate Guard
//!
//! Guarded remote-procedure style methods.
//!
//! A [`MethodDefinition`] names a handler and declares its allow or deny
//! rules. [`MethodGuard::wrap`] validates those rules once against a role
//! store and yields a [`GuardedMethod`] whose handler only runs when the
//! decision engine permits the caller, or through the explicit trusted path.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use rolegate_engine::{InMemoryRoleStore, Rule};
//! use rolegate_guard::{CallContext, FnMethod, MethodDefinition, MethodGuard};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryRoleStore::new());
//!     store.assign("alice", &["admin"], "ops").await;
//!
//!     let handler = Arc::new(FnMethod::new(|_ctx, args| {
//!         Box::pin(async move { Ok(args) })
//!     }));
//!
//!     let definition = MethodDefinition::builder("restartService", handler)
//!         .allow(vec![Rule::new("admin", "ops")])
//!         .build();
//!
//!     let guard = MethodGuard::new(store);
//!     let method = guard.wrap(definition)?;
//!
//!     let result = method
//!         .run(&CallContext::authenticated("alice"), json!({ "service": "api" }))
//!         .await?;
//!     assert_eq!(result["service"], "api");
//!
//!     // Unauthorized callers are refused before the handler runs.
//!     let refused = method
//!         .run(&CallContext::authenticated("mallory"), json!({}))
//!         .await;
//!     assert!(refused.is_err());
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod definition;
pub mod error;
pub mod guard;
pub mod method;
pub mod registry;

// Re-export commonly used types
pub use context::CallContext;
pub use definition::{MethodDefinition, MethodDefinitionBuilder, PermissionsError};
pub use error::{AuthorizationError, MethodError, Result};
pub use guard::{GuardedMethod, MethodGuard};
pub use method::{FnMethod, Method};
pub use registry::MethodRegistry;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
