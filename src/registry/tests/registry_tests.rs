//! Unit tests for registry registration, instantiation, and status control.

use super::support::{ManualClock, handlerless_factory, tool_descriptor};
use crate::registry::{
    adapters::{InMemoryToolFactory, Tool, ToolRegistry},
    domain::{EntityKind, HealthStatus, RegistryConfig, Status},
    ports::{Entity, EntityConfig},
    resilience::CreationError,
    services::RegistryError,
};
use chrono::TimeDelta;
use rstest::{fixture, rstest};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[fixture]
fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new())
}

#[fixture]
fn registry(clock: Arc<ManualClock>) -> ToolRegistry<ManualClock> {
    let registry = ToolRegistry::new(clock);
    registry.start().expect("start should succeed");
    registry
}

#[rstest]
fn register_records_descriptor_metadata(registry: ToolRegistry<ManualClock>) {
    let factory = InMemoryToolFactory::new(
        tool_descriptor("search").with_tags(["web"]),
        Tool::new("search", "Searches"),
    );
    registry
        .register("search", Arc::new(factory))
        .expect("registration should succeed");

    let info = registry.info("search").expect("entry should exist");
    assert_eq!(info.identifier(), "search");
    assert_eq!(info.version(), "1.0.0");
    assert_eq!(info.tags(), ["web".to_owned()]);
    assert!(info.capabilities().contains("tools"));
    assert_eq!(info.status(), Status::Registered);
    assert_eq!(info.registered_at(), info.updated_at());
    assert_eq!(registry.kind(), EntityKind::Tool);
    assert_eq!(registry.len(), 1);
}

#[rstest]
fn register_rejects_identifier_mismatch(registry: ToolRegistry<ManualClock>) {
    let result = registry.register("other", Arc::new(InMemoryToolFactory::echo("echo")));

    let Err(RegistryError::InvalidIdentifier { identifier, source }) = &result else {
        panic!("expected invalid identifier, got {result:?}");
    };
    assert_eq!(identifier, "other");
    assert!(source.to_string().contains("does not match factory identifier 'echo'"));
    assert!(registry.is_empty());
}

#[rstest]
fn register_rejects_malformed_identifier(registry: ToolRegistry<ManualClock>) {
    let result = registry.register("bad name", Arc::new(InMemoryToolFactory::echo("bad name")));

    assert!(matches!(
        result,
        Err(RegistryError::InvalidIdentifier { .. })
    ));
    assert!(registry.list().is_empty());
}

#[rstest]
fn register_rejects_invalid_descriptor(registry: ToolRegistry<ManualClock>) {
    let descriptor = crate::registry::domain::FactoryDescriptor::new("draft", "Draft", "", "1");
    let factory = InMemoryToolFactory::new(descriptor, Tool::new("draft", "Draft"));

    let result = registry.register("draft", Arc::new(factory));

    let Err(RegistryError::ValidationFailed { source, .. }) = &result else {
        panic!("expected validation failure, got {result:?}");
    };
    assert!(source.has_field("description"));
    assert!(source.has_field("capabilities"));
}

#[rstest]
fn register_runs_factory_config_check(registry: ToolRegistry<ManualClock>) {
    let factory = Arc::new(InMemoryToolFactory::echo("fetch").with_required_key("endpoint"));

    let rejected = registry.register("fetch", factory.clone());
    assert!(matches!(
        rejected,
        Err(RegistryError::ValidationFailed { ref source, .. }) if source.has_field("config")
    ));

    registry
        .register_with_config(
            "fetch",
            factory,
            EntityConfig::new().with("endpoint", "https://example.com"),
        )
        .expect("registration with config should succeed");
    assert_eq!(registry.len(), 1);
}

#[rstest]
fn duplicate_registration_keeps_original(registry: ToolRegistry<ManualClock>) {
    let original = Arc::new(InMemoryToolFactory::echo("echo"));
    registry
        .register("echo", original.clone())
        .expect("registration should succeed");

    let duplicate = registry.register("echo", Arc::new(InMemoryToolFactory::echo("echo")));

    assert!(matches!(
        duplicate,
        Err(RegistryError::AlreadyExists { kind: EntityKind::Tool, ref identifier }) if identifier == "echo"
    ));
    let stored = registry.get_factory("echo").expect("factory should exist");
    assert!(std::ptr::addr_eq(Arc::as_ptr(&stored), Arc::as_ptr(&original)));
}

#[rstest]
fn with_config_rejects_out_of_range_values(clock: Arc<ManualClock>) {
    let config = RegistryConfig {
        creation_timeout_secs: 0,
        ..RegistryConfig::default()
    };

    let result = ToolRegistry::<ManualClock>::with_config(config, clock);

    assert!(matches!(result, Err(RegistryError::InvalidConfig(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn get_creates_once_and_retains(registry: ToolRegistry<ManualClock>) {
    let factory = Arc::new(InMemoryToolFactory::echo("echo"));
    registry
        .register("echo", factory.clone())
        .expect("registration should succeed");

    let first = registry.get("echo").await.expect("get should succeed");
    let second = registry.get("echo").await.expect("get should succeed");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(factory.creations(), 1);
    let info = registry.info("echo").expect("entry should exist");
    assert_eq!(info.status(), Status::Loaded);
    assert!(info.metadata().contains_key("loaded_at"));
    assert_eq!(
        first.call(json!({"text": "hi"})).await.expect("call should succeed"),
        json!({"text": "hi"})
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn get_unknown_identifier_is_not_found(registry: ToolRegistry<ManualClock>) {
    let result = registry.get("missing").await;

    assert!(matches!(
        result,
        Err(RegistryError::NotFound { ref identifier, .. }) if identifier == "missing"
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn creation_failure_moves_entry_to_error(registry: ToolRegistry<ManualClock>) {
    let factory = Arc::new(InMemoryToolFactory::echo("echo"));
    factory.set_failing(true);
    registry
        .register("echo", factory)
        .expect("registration should succeed");

    let result = registry.get("echo").await;

    assert!(matches!(
        result,
        Err(RegistryError::CreationFailed {
            source: CreationError::Factory(_),
            ..
        })
    ));
    let info = registry.info("echo").expect("entry should exist");
    assert_eq!(info.status(), Status::Error);
    assert!(
        info.last_error()
            .is_some_and(|message| message.contains("configured to fail"))
    );
    assert_eq!(registry.health().status(), HealthStatus::Degraded);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_entity_is_not_retained(registry: ToolRegistry<ManualClock>) {
    registry
        .register("draft", Arc::new(handlerless_factory("draft")))
        .expect("registration should succeed");

    let result = registry.get("draft").await;

    let Err(RegistryError::ValidationFailed { source, .. }) = &result else {
        panic!("expected validation failure, got {result:?}");
    };
    assert!(source.has_field("handler"));
    assert_eq!(registry.status("draft").expect("entry should exist"), Status::Error);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelled_get_leaves_status_untouched(registry: ToolRegistry<ManualClock>) {
    let factory = InMemoryToolFactory::echo("slow").with_delay(Duration::from_secs(5));
    registry
        .register("slow", Arc::new(factory))
        .expect("registration should succeed");
    let token = CancellationToken::new();
    token.cancel();

    let result = registry.get_with_cancellation(&token, "slow").await;

    assert!(matches!(
        result,
        Err(RegistryError::CreationFailed {
            source: CreationError::Cancelled,
            ..
        })
    ));
    assert_eq!(registry.status("slow").expect("entry should exist"), Status::Registered);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_first_gets_share_one_retained_entity(registry: ToolRegistry<ManualClock>) {
    let factory =
        Arc::new(InMemoryToolFactory::echo("echo").with_delay(Duration::from_millis(100)));
    registry
        .register("echo", factory.clone())
        .expect("registration should succeed");

    let (first_get, second_get) = tokio::join!(registry.get("echo"), registry.get("echo"));
    let first = first_get.expect("get should succeed");
    let second = second_get.expect("get should succeed");

    assert!(Arc::ptr_eq(&first, &second));
    assert!((1..=2).contains(&factory.creations()));
    assert_eq!(registry.status("echo").expect("entry should exist"), Status::Loaded);
    let retained = registry.get("echo").await.expect("get should succeed");
    assert!(Arc::ptr_eq(&first, &retained));
}

async fn reregister_during_creation(
    registry: &ToolRegistry<ManualClock>,
    replacement: Arc<InMemoryToolFactory>,
) {
    tokio::time::sleep(Duration::from_millis(30)).await;
    registry.unregister("echo").expect("unregister should succeed");
    registry
        .register("echo", replacement)
        .expect("re-registration should succeed");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_creation_is_not_retained_after_reregistration(
    registry: ToolRegistry<ManualClock>,
) {
    let stale = InMemoryToolFactory::echo("echo").with_delay(Duration::from_millis(200));
    registry
        .register("echo", Arc::new(stale))
        .expect("registration should succeed");
    let replacement = Arc::new(InMemoryToolFactory::echo("echo"));

    let (result, ()) = tokio::join!(
        registry.get("echo"),
        reregister_during_creation(&registry, replacement.clone())
    );

    assert!(matches!(result, Err(RegistryError::NotFound { .. })));
    assert_eq!(registry.status("echo").expect("entry should exist"), Status::Registered);
    registry.get("echo").await.expect("get should succeed");
    assert_eq!(replacement.creations(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_creation_failure_does_not_demote_reregistration(
    registry: ToolRegistry<ManualClock>,
) {
    let stale = InMemoryToolFactory::echo("echo").with_delay(Duration::from_millis(200));
    stale.set_failing(true);
    registry
        .register("echo", Arc::new(stale))
        .expect("registration should succeed");

    let (result, ()) = tokio::join!(
        registry.get("echo"),
        reregister_during_creation(&registry, Arc::new(InMemoryToolFactory::echo("echo")))
    );

    assert!(matches!(result, Err(RegistryError::CreationFailed { .. })));
    let info = registry.info("echo").expect("entry should exist");
    assert_eq!(info.status(), Status::Registered);
    assert!(info.last_error().is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn disabled_entry_hands_out_unretained_entity(registry: ToolRegistry<ManualClock>) {
    let factory = Arc::new(InMemoryToolFactory::echo("echo"));
    registry
        .register("echo", factory.clone())
        .expect("registration should succeed");
    registry
        .transition_status("echo", Status::Disabled)
        .expect("transition should succeed");

    let first = registry.get("echo").await.expect("get should succeed");
    let second = registry.get("echo").await.expect("get should succeed");

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(factory.creations(), 2);
    assert_eq!(registry.status("echo").expect("entry should exist"), Status::Disabled);
}

#[rstest]
#[case(Status::Disabled)]
#[case(Status::Error)]
#[tokio::test(flavor = "multi_thread")]
async fn purging_transitions_drop_live_entity(
    registry: ToolRegistry<ManualClock>,
    #[case] target: Status,
) {
    let factory = Arc::new(InMemoryToolFactory::echo("echo"));
    registry
        .register("echo", factory.clone())
        .expect("registration should succeed");
    registry.get("echo").await.expect("get should succeed");

    registry
        .transition_status("echo", target)
        .expect("transition should succeed");
    registry
        .transition_status("echo", Status::Registered)
        .expect("transition should succeed");
    registry.get("echo").await.expect("get should succeed");

    assert_eq!(factory.creations(), 2);
}

#[rstest]
fn transition_checks_table(registry: ToolRegistry<ManualClock>) {
    registry
        .register("echo", Arc::new(InMemoryToolFactory::echo("echo")))
        .expect("registration should succeed");

    let result = registry.transition_status("echo", Status::Active);

    assert!(matches!(
        result,
        Err(RegistryError::InvalidTransition {
            from: Status::Registered,
            to: Status::Active,
            ..
        })
    ));
    assert!(matches!(
        registry.transition_status("missing", Status::Disabled),
        Err(RegistryError::NotFound { .. })
    ));
}

#[rstest]
fn stopped_registry_rejects_live_targets(clock: Arc<ManualClock>) {
    let registry = ToolRegistry::new(clock);
    registry
        .register("echo", Arc::new(InMemoryToolFactory::echo("echo")))
        .expect("registration should succeed");

    for target in [Status::Loaded, Status::Active] {
        assert!(matches!(
            registry.transition_status("echo", target),
            Err(RegistryError::RegistryNotRunning { .. })
        ));
    }
    registry
        .transition_status("echo", Status::Disabled)
        .expect("disabling does not need a running registry");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn refresh_replaces_retained_entity(registry: ToolRegistry<ManualClock>) {
    let factory = Arc::new(InMemoryToolFactory::echo("echo"));
    registry
        .register("echo", factory.clone())
        .expect("registration should succeed");
    let before = registry.get("echo").await.expect("get should succeed");

    registry
        .refresh(&CancellationToken::new(), "echo")
        .await
        .expect("refresh should succeed");
    let after = registry.get("echo").await.expect("get should succeed");

    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(factory.creations(), 2);
    let info = registry.info("echo").expect("entry should exist");
    assert_eq!(info.status(), Status::Loaded);
    assert!(info.metadata().contains_key("refreshed_at"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_refresh_moves_entry_to_error(registry: ToolRegistry<ManualClock>) {
    let factory = Arc::new(InMemoryToolFactory::echo("echo"));
    registry
        .register("echo", factory.clone())
        .expect("registration should succeed");
    registry.get("echo").await.expect("get should succeed");
    factory.set_failing(true);

    let result = registry.refresh(&CancellationToken::new(), "echo").await;

    assert!(matches!(result, Err(RegistryError::CreationFailed { .. })));
    assert_eq!(registry.status("echo").expect("entry should exist"), Status::Error);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn refresh_requires_live_status(registry: ToolRegistry<ManualClock>) {
    registry
        .register("echo", Arc::new(InMemoryToolFactory::echo("echo")))
        .expect("registration should succeed");

    let result = registry.refresh(&CancellationToken::new(), "echo").await;

    assert!(matches!(
        result,
        Err(RegistryError::RefreshNotAllowed {
            status: Status::Registered,
            ..
        })
    ));
}

#[rstest]
fn start_twice_is_rejected(registry: ToolRegistry<ManualClock>) {
    assert!(matches!(
        registry.start(),
        Err(RegistryError::AlreadyRunning(EntityKind::Tool))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stop_disables_everything_and_is_idempotent(registry: ToolRegistry<ManualClock>) {
    for name in ["alpha", "beta"] {
        registry
            .register(name, Arc::new(InMemoryToolFactory::echo(name)))
            .expect("registration should succeed");
    }
    registry.get("alpha").await.expect("get should succeed");

    registry.stop();
    registry.stop();

    assert!(!registry.is_running());
    assert!(
        registry
            .list()
            .iter()
            .all(|info| info.status() == Status::Disabled)
    );
    assert_eq!(registry.health().status(), HealthStatus::Stopped);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unregister_removes_every_trace(registry: ToolRegistry<ManualClock>) {
    registry
        .register("echo", Arc::new(InMemoryToolFactory::echo("echo")))
        .expect("registration should succeed");
    registry.get("echo").await.expect("get should succeed");

    registry.unregister("echo").expect("unregister should succeed");

    assert!(registry.is_empty());
    assert!(matches!(
        registry.get("echo").await,
        Err(RegistryError::NotFound { .. })
    ));
    assert!(matches!(
        registry.unregister("echo"),
        Err(RegistryError::NotFound { .. })
    ));
    assert!(registry.health().circuit_breakers().is_empty());
}

#[rstest]
fn set_metadata_updates_timestamp(clock: Arc<ManualClock>) {
    let registry = ToolRegistry::new(Arc::clone(&clock));
    registry
        .register("echo", Arc::new(InMemoryToolFactory::echo("echo")))
        .expect("registration should succeed");
    clock.advance(TimeDelta::seconds(5));

    registry
        .set_metadata("echo", "owner", json!("platform"))
        .expect("metadata update should succeed");

    let info = registry.info("echo").expect("entry should exist");
    assert_eq!(info.metadata().get("owner"), Some(&json!("platform")));
    assert_eq!(
        info.updated_at() - info.registered_at(),
        TimeDelta::seconds(5)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn validate_all_demotes_rejected_configuration(registry: ToolRegistry<ManualClock>) {
    let kept = Arc::new(InMemoryToolFactory::echo("kept"));
    let rejected = Arc::new(InMemoryToolFactory::echo("rejected"));
    registry
        .register("kept", kept)
        .expect("registration should succeed");
    registry
        .register("rejected", rejected.clone())
        .expect("registration should succeed");
    registry
        .load_all(&CancellationToken::new())
        .await
        .expect("load should succeed");
    rejected.set_rejecting_config(true);

    let error = registry
        .validate_all(&CancellationToken::new())
        .expect_err("validation should report one failure");

    assert_eq!(error.failed_identifiers(), vec!["rejected"]);
    assert_eq!(
        error.to_string(),
        "validate_all failed for 1 of 2 tool entries: rejected"
    );
    assert_eq!(registry.status("kept").expect("entry should exist"), Status::Active);
    assert_eq!(registry.status("rejected").expect("entry should exist"), Status::Error);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn bulk_passes_stop_when_cancelled(registry: ToolRegistry<ManualClock>) {
    registry
        .register("echo", Arc::new(InMemoryToolFactory::echo("echo")))
        .expect("registration should succeed");
    let token = CancellationToken::new();
    token.cancel();

    assert!(matches!(
        registry.load_all(&token).await,
        Err(RegistryError::Cancelled { operation: "load_all" })
    ));
    assert!(matches!(
        registry.validate_all(&token),
        Err(RegistryError::Cancelled { .. })
    ));
    assert_eq!(registry.status("echo").expect("entry should exist"), Status::Registered);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelled_bulk_passes_report_cancellation_with_nothing_to_do(
    registry: ToolRegistry<ManualClock>,
) {
    let token = CancellationToken::new();
    token.cancel();

    assert!(matches!(
        registry.load_all(&token).await,
        Err(RegistryError::Cancelled { operation: "load_all" })
    ));
    assert!(matches!(
        registry.validate_all(&token),
        Err(RegistryError::Cancelled { operation: "validate_all" })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn health_reports_statuses_and_uptime(clock: Arc<ManualClock>) {
    let registry = ToolRegistry::new(Arc::clone(&clock));
    registry
        .register("echo", Arc::new(InMemoryToolFactory::echo("echo")))
        .expect("registration should succeed");
    registry.start().expect("start should succeed");
    registry.get("echo").await.expect("get should succeed");
    clock.advance(TimeDelta::seconds(42));

    let health = registry.health();

    assert_eq!(health.status(), HealthStatus::Healthy);
    assert_eq!(health.kind(), EntityKind::Tool);
    assert_eq!(health.total(), 1);
    assert_eq!(health.count_in(Status::Loaded), 1);
    assert_eq!(health.uptime_secs(), Some(42));
    assert!(
        health
            .circuit_breakers()
            .get("echo")
            .is_some_and(|status| status.starts_with("closed"))
    );
    assert_eq!(health.cache().size(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn retained_tool_reports_its_name(registry: ToolRegistry<ManualClock>) {
    registry
        .register("echo", Arc::new(InMemoryToolFactory::echo("echo")))
        .expect("registration should succeed");

    let tool = registry.get("echo").await.expect("get should succeed");

    assert_eq!(Entity::name(tool.as_ref()), "echo");
    assert!(tool.has_handler());
}
