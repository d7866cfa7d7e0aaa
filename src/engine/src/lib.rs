//! # Rolegate Decision Engine
//!
//! Role- and scope-based access decisions for guarded operations.
//!
//! A definition declares either allow rules or deny rules. The engine
//! evaluates them in order against a pluggable [`RoleStore`] and renders a
//! [`Verdict`]; the companion guard crate turns that verdict into an invoked
//! handler or a refusal.
//!
//! ## Features
//!
//! - **Tagged selectors** for roles and scopes: any, named, or listed, plus
//!   scopes computed from the call itself
//! - **Per-rule predicates** over the caller identity and the call arguments
//! - **Construction-time validation** of definitions ([`DefinitionError`])
//! - **First-match short-circuit** with strictly sequential rule order
//! - **Async-first design** using the Tokio runtime
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use rolegate_engine::{
//!     AccessPolicy, AllowSpec, DecisionEngine, InMemoryRoleStore, Rule, Verdict,
//! };
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryRoleStore::new());
//!     store.assign("alice", &["admin"], "ops").await;
//!
//!     let policy = AccessPolicy::from_options(
//!         Some(AllowSpec::Rules(vec![Rule::new("admin", "ops")])),
//!         None,
//!     )?
//!     .expect("policy was declared");
//!
//!     let engine = DecisionEngine::new(store);
//!     let verdict = engine.decide(Some(&policy), Some("alice"), &json!({})).await;
//!     assert_eq!(verdict, Verdict::Permit);
//!
//!     Ok(())
//! }
//! ```

pub mod decision;
pub mod error;
pub mod policy;
pub mod rule;
pub mod store;

// Re-export commonly used types
pub use decision::{DecisionEngine, Verdict};
pub use error::{DefinitionError, Result};
pub use policy::{AccessPolicy, AllowSpec};
pub use rule::{Predicate, ResolvedScope, RoleSpec, Rule, RuleBuilder, ScopeFn, ScopeSpec};
pub use store::{InMemoryRoleStore, RoleStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
