//! Guarded method integration tests
//!
//! Exercises the caller/method matrix end to end: allow and deny lists,
//! predicate rules, logged-in rules, computed scopes, the trusted path and
//! its propagation into nested calls, and the refusal errors callers see.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rolegate_engine::{InMemoryRoleStore, ResolvedScope, Rule, ScopeSpec};
use rolegate_guard::{
    AuthorizationError, CallContext, FnMethod, GuardedMethod, Method, MethodDefinition,
    MethodError, MethodGuard, MethodRegistry, PermissionsError, Result,
};
use serde_json::{json, Value};

/// Scope the fixtures assign every role in. An ordinary name, not a wildcard.
const GLOBAL: &str = "*";

/// Handler that counts invocations and echoes its arguments.
struct Recorder {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Method for Recorder {
    async fn run(&self, _ctx: &CallContext, args: Value) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(args)
    }
}

/// Handler that forwards its own context into another guarded method.
struct Nested {
    inner: Arc<GuardedMethod>,
}

#[async_trait]
impl Method for Nested {
    async fn run(&self, ctx: &CallContext, args: Value) -> Result<Value> {
        self.inner.run(ctx, args).await
    }
}

/// admin holds admin; fancy holds fancy and basic; basic holds basic.
/// "plain" is authenticated but holds no roles at all.
async fn seeded_store() -> Arc<InMemoryRoleStore> {
    let store = InMemoryRoleStore::new();
    store.assign("admin", &["admin"], GLOBAL).await;
    store.assign("fancy", &["fancy", "basic"], GLOBAL).await;
    store.assign("basic", &["basic"], GLOBAL).await;
    Arc::new(store)
}

fn counting() -> (Arc<AtomicUsize>, Arc<Recorder>) {
    let calls = Arc::new(AtomicUsize::new(0));
    (Arc::clone(&calls), Arc::new(Recorder { calls }))
}

async fn wrap(definition: MethodDefinition) -> GuardedMethod {
    MethodGuard::new(seeded_store().await)
        .wrap(definition)
        .unwrap()
}

fn user(identity: &str) -> CallContext {
    CallContext::authenticated(identity)
}

async fn can_call(method: &GuardedMethod, ctx: &CallContext) -> bool {
    method.run(ctx, json!({ "text": "blah" })).await.is_ok()
}

// ============================================================================
// ALLOW LISTS
// ============================================================================

#[tokio::test]
async fn admin_method_admits_only_admins() {
    let (calls, handler) = counting();
    let method = wrap(
        MethodDefinition::builder("restartService", handler)
            .allow(vec![Rule::new("admin", GLOBAL)])
            .build(),
    )
    .await;

    assert!(can_call(&method, &user("admin")).await);
    assert!(!can_call(&method, &user("fancy")).await);
    assert!(!can_call(&method, &user("basic")).await);
    assert!(!can_call(&method, &user("plain")).await);
    assert!(!can_call(&method, &CallContext::anonymous()).await);

    // Exactly one of the five attempts reached the handler.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn listed_roles_admit_any_holder() {
    let (calls, handler) = counting();
    let method = wrap(
        MethodDefinition::builder("insertItem", handler)
            .allow(vec![Rule::new(vec!["basic", "admin"], GLOBAL)])
            .build(),
    )
    .await;

    assert!(can_call(&method, &user("admin")).await);
    assert!(can_call(&method, &user("fancy")).await);
    assert!(can_call(&method, &user("basic")).await);
    assert!(!can_call(&method, &user("plain")).await);
    assert!(!can_call(&method, &CallContext::anonymous()).await);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn predicate_rules_inspect_the_arguments() {
    let (_, handler) = counting();
    let method = wrap(
        MethodDefinition::builder("insertItem", handler)
            .allow(vec![Rule::new(vec!["basic", "admin"], GLOBAL)
                .with_predicate(|_, args| args["text"] == "blah")])
            .build(),
    )
    .await;

    assert!(method
        .run(&user("basic"), json!({ "text": "blah" }))
        .await
        .is_ok());
    assert!(method
        .run(&user("basic"), json!({ "text": "spam" }))
        .await
        .is_err());

    // A predicate never rescues a caller the selectors refuse.
    assert!(method
        .run(&user("plain"), json!({ "text": "blah" }))
        .await
        .is_err());
}

#[tokio::test]
async fn single_role_methods_require_that_exact_role() {
    let (_, handler) = counting();
    let method = wrap(
        MethodDefinition::builder("fancyReport", handler)
            .allow(vec![Rule::new("fancy", GLOBAL)])
            .build(),
    )
    .await;

    assert!(can_call(&method, &user("fancy")).await);
    assert!(!can_call(&method, &user("admin")).await);
    assert!(!can_call(&method, &user("basic")).await);
}

#[tokio::test]
async fn allow_anyone_admits_even_anonymous_callers() {
    let (calls, handler) = counting();
    let method = wrap(
        MethodDefinition::builder("readBanner", handler)
            .allow_anyone()
            .build(),
    )
    .await;

    assert!(can_call(&method, &user("admin")).await);
    assert!(can_call(&method, &user("plain")).await);
    assert!(can_call(&method, &CallContext::anonymous()).await);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn logged_in_rule_admits_any_authenticated_caller() {
    let (_, handler) = counting();
    let method = wrap(
        MethodDefinition::builder("whoAmI", handler)
            .allow(vec![Rule::logged_in()])
            .build(),
    )
    .await;

    assert!(can_call(&method, &user("admin")).await);
    assert!(can_call(&method, &user("plain")).await);
    assert!(!can_call(&method, &CallContext::anonymous()).await);
}

// ============================================================================
// DENY LISTS
// ============================================================================

#[tokio::test]
async fn deny_method_blocks_holders_of_the_listed_role() {
    let (_, handler) = counting();
    let method = wrap(
        MethodDefinition::builder("exportData", handler)
            .deny(vec![Rule::new("basic", GLOBAL)])
            .build(),
    )
    .await;

    assert!(can_call(&method, &user("admin")).await);
    assert!(can_call(&method, &user("plain")).await);
    assert!(!can_call(&method, &user("basic")).await);
    // fancy also holds basic, so the deny rule catches them too.
    assert!(!can_call(&method, &user("fancy")).await);
    // Anonymous callers never pass a deny-only method.
    assert!(!can_call(&method, &CallContext::anonymous()).await);
}

#[tokio::test]
async fn deny_predicates_and_further_rules_stack() {
    let (_, handler) = counting();
    let method = wrap(
        MethodDefinition::builder("exportData", handler)
            .deny(vec![
                Rule::new("basic", GLOBAL).with_predicate(|_, args| args["text"] == "blah"),
                Rule::new("fancy", GLOBAL),
            ])
            .build(),
    )
    .await;

    // basic is denied only when the predicate bites.
    assert!(method
        .run(&user("basic"), json!({ "text": "spam" }))
        .await
        .is_ok());
    assert!(method
        .run(&user("basic"), json!({ "text": "blah" }))
        .await
        .is_err());

    // fancy is denied unconditionally by the second rule.
    assert!(method
        .run(&user("fancy"), json!({ "text": "spam" }))
        .await
        .is_err());

    assert!(method
        .run(&user("admin"), json!({ "text": "blah" }))
        .await
        .is_ok());
}

// ============================================================================
// UNDECLARED POLICIES AND THE TRUSTED PATH
// ============================================================================

#[tokio::test]
async fn undeclared_methods_refuse_every_untrusted_caller() {
    let (calls, handler) = counting();
    let method = wrap(MethodDefinition::builder("maintenance", handler).build()).await;

    assert!(!can_call(&method, &user("admin")).await);
    assert!(!can_call(&method, &user("plain")).await);
    assert!(!can_call(&method, &CallContext::anonymous()).await);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let result = method.run_trusted(json!({ "text": "blah" })).await.unwrap();
    assert_eq!(result["text"], "blah");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn run_trusted_bypasses_declared_rules_too() {
    let (_, handler) = counting();
    let method = wrap(
        MethodDefinition::builder("restartService", handler)
            .allow(vec![Rule::new("admin", GLOBAL)])
            .build(),
    )
    .await;

    assert!(method.run_trusted(json!({})).await.is_ok());
}

#[tokio::test]
async fn no_public_context_reaches_the_trusted_path() {
    let (calls, handler) = counting();
    let method = wrap(MethodDefinition::builder("maintenance", handler).build()).await;

    // Every context a caller can construct is untrusted, and cloning one
    // does not change that.
    let contexts = [
        CallContext::anonymous(),
        CallContext::authenticated("admin"),
        CallContext::default(),
        CallContext::authenticated("admin").clone(),
    ];
    for ctx in &contexts {
        assert!(!ctx.is_trusted());
        assert!(method.run(ctx, json!({})).await.is_err());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// NESTED GUARDED CALLS
// ============================================================================

#[tokio::test]
async fn nested_calls_re_evaluate_the_inner_rules() {
    let guard = MethodGuard::new(seeded_store().await);

    let (inner_calls, inner_handler) = counting();
    let inner = Arc::new(
        guard
            .wrap(
                MethodDefinition::builder("restartService", inner_handler)
                    .allow(vec![Rule::new("admin", GLOBAL)])
                    .build(),
            )
            .unwrap(),
    );

    let outer = guard
        .wrap(
            MethodDefinition::builder(
                "auditedRestart",
                Arc::new(Nested {
                    inner: Arc::clone(&inner),
                }),
            )
            .allow(vec![Rule::new(vec!["basic", "admin"], GLOBAL)])
            .build(),
        )
        .unwrap();

    // The outer rules admit basic, but the inner method still refuses them.
    assert!(outer.run(&user("admin"), json!({})).await.is_ok());
    assert!(outer.run(&user("basic"), json!({})).await.is_err());
    assert_eq!(inner_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn trust_propagates_into_nested_calls() {
    let guard = MethodGuard::new(seeded_store().await);

    let (inner_calls, inner_handler) = counting();
    let inner = Arc::new(
        guard
            .wrap(
                MethodDefinition::builder("restartService", inner_handler)
                    .allow(vec![Rule::new("admin", GLOBAL)])
                    .build(),
            )
            .unwrap(),
    );

    let outer = guard
        .wrap(MethodDefinition::builder("maintenance", Arc::new(Nested { inner })).build())
        .unwrap();

    // run_trusted hands the handler a trusted context, which the nested
    // guarded call honors without re-evaluating any rules.
    assert!(outer.run_trusted(json!({})).await.is_ok());
    assert_eq!(inner_calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// COMPUTED SCOPES THROUGH THE GUARD
// ============================================================================

#[tokio::test]
async fn computed_scopes_route_by_argument() {
    let store = InMemoryRoleStore::new();
    store.assign("lead", &["manager"], "ops").await;
    let guard = MethodGuard::new(Arc::new(store));

    let handler = Arc::new(FnMethod::new(|_ctx, args| {
        Box::pin(async move { Ok(args) })
    }));
    let method = guard
        .wrap(
            MethodDefinition::builder("closeTeamTickets", handler)
                .allow(vec![Rule::new(
                    "manager",
                    ScopeSpec::computed(|_, args| {
                        ResolvedScope::Named(args["team"].as_str().unwrap_or("").to_string())
                    }),
                )])
                .build(),
        )
        .unwrap();

    assert!(method
        .run(&user("lead"), json!({ "team": "ops" }))
        .await
        .is_ok());
    assert!(method
        .run(&user("lead"), json!({ "team": "billing" }))
        .await
        .is_err());
}

// ============================================================================
// REFUSAL ERRORS
// ============================================================================

#[tokio::test]
async fn refusals_carry_the_default_error() {
    let (_, handler) = counting();
    let method = wrap(
        MethodDefinition::builder("restartService", handler)
            .allow(vec![Rule::new("admin", GLOBAL)])
            .build(),
    )
    .await;

    assert_eq!(method.permissions_error().name(), "MethodGuard.NotAllowed");

    let error = method.run(&user("basic"), json!({})).await.unwrap_err();
    match error {
        MethodError::NotAllowed(AuthorizationError { name, message }) => {
            assert_eq!(name, "MethodGuard.NotAllowed");
            assert_eq!(message, "User basic is not allowed to use restartService");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let error = method
        .run(&CallContext::anonymous(), json!({}))
        .await
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "User anonymous is not allowed to use restartService"
    );
}

#[tokio::test]
async fn refusals_can_be_overridden_per_method() {
    let (_, handler) = counting();
    let method = wrap(
        MethodDefinition::builder("exportData", handler)
            .allow(vec![Rule::new("admin", GLOBAL)])
            .permissions_error(PermissionsError::new("Billing.Refused", |identity| {
                format!(
                    "{} may not export billing data",
                    identity.unwrap_or("strangers")
                )
            }))
            .build(),
    )
    .await;

    let error = method.run(&user("basic"), json!({})).await.unwrap_err();
    match error {
        MethodError::NotAllowed(refused) => {
            assert_eq!(refused.name, "Billing.Refused");
            assert_eq!(refused.message, "basic may not export billing data");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn handler_failures_pass_through_unchanged() {
    struct Failing;

    #[async_trait]
    impl Method for Failing {
        async fn run(&self, _ctx: &CallContext, _args: Value) -> Result<Value> {
            Err(MethodError::Failed("backend unavailable".into()))
        }
    }

    let method = wrap(
        MethodDefinition::builder("flaky", Arc::new(Failing))
            .allow_anyone()
            .build(),
    )
    .await;

    let error = method
        .run(&CallContext::anonymous(), json!({}))
        .await
        .unwrap_err();
    assert!(matches!(error, MethodError::Failed(_)));
}

// ============================================================================
// REGISTRY DISPATCH
// ============================================================================

#[tokio::test]
async fn registry_dispatches_with_rules_applied() {
    let guard = MethodGuard::new(seeded_store().await);
    let registry = MethodRegistry::new();

    let (_, restart_handler) = counting();
    registry
        .register(
            guard
                .wrap(
                    MethodDefinition::builder("restartService", restart_handler)
                        .allow(vec![Rule::new("admin", GLOBAL)])
                        .build(),
                )
                .unwrap(),
        )
        .await
        .unwrap();

    let (maintenance_calls, maintenance_handler) = counting();
    registry
        .register(
            guard
                .wrap(MethodDefinition::builder("maintenance", maintenance_handler).build())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(registry
        .call("restartService", &user("admin"), json!({}))
        .await
        .is_ok());
    assert!(registry
        .call("restartService", &user("basic"), json!({}))
        .await
        .is_err());

    // The undeclared method is only reachable through the trusted path.
    assert!(registry
        .call("maintenance", &user("admin"), json!({}))
        .await
        .is_err());
    assert!(registry.call_trusted("maintenance", json!({})).await.is_ok());
    assert_eq!(maintenance_calls.load(Ordering::SeqCst), 1);

    let mut names = registry.names().await;
    names.sort();
    assert_eq!(names, vec!["maintenance", "restartService"]);
}
