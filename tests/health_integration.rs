//! Integration tests for health monitoring and its effect on routing.

mod common;

use common::{harness, ScriptedExecutor};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use relay::breaker::{BreakerConfig, CircuitState};
use relay::config::ProviderConfig;
use relay::health::{HealthConfig, HealthMonitor};
use relay::routing::{CandidateFailure, RouteError};
use relay::workload::ExecutionRequest;

fn fragile_provider(name: &str) -> ProviderConfig {
    ProviderConfig {
        circuit_breaker: BreakerConfig {
            failure_threshold: 2,
            recovery_timeout_seconds: 3600,
        },
        ..ProviderConfig::named(name)
    }
}

#[tokio::test]
async fn probe_failures_open_circuit_and_router_skips_provider() {
    let h = harness(vec![fragile_provider("a"), ProviderConfig::named("b")]);
    h.executor.succeed("a", "unused");
    h.executor.succeed("b", "from b");
    h.executor.probe_down("a");

    let monitor = HealthMonitor::new(
        h.registry.clone(),
        h.executor.clone(),
        HealthConfig::default(),
    );

    // Two failed probe cycles cross the breaker threshold.
    monitor.probe_all().await;
    monitor.probe_all().await;

    let snapshot = monitor.snapshot("a").unwrap();
    assert!(!snapshot.available);
    assert_eq!(snapshot.circuit_state, CircuitState::Open);

    let response = h
        .router
        .route(ExecutionRequest::new("hello"))
        .await
        .unwrap();
    assert_eq!(response.provider, "b");
    assert_eq!(h.executor.invocations(), vec!["b"]);
    assert_eq!(response.trail[0].failure, CandidateFailure::CircuitOpen);
}

#[tokio::test]
async fn recovered_probe_restores_availability() {
    let h = harness(vec![ProviderConfig::named("a")]);
    h.executor.probe_down("a");

    let monitor = HealthMonitor::new(
        h.registry.clone(),
        h.executor.clone(),
        HealthConfig::default(),
    );
    monitor.probe_all().await;
    assert!(!monitor.snapshot("a").unwrap().available);

    h.executor.probe_up("a");
    monitor.probe_all().await;

    let snapshot = monitor.snapshot("a").unwrap();
    assert!(snapshot.available);
    assert!(snapshot.last_probe_at.is_some());
}

#[tokio::test]
async fn snapshot_never_blocks_on_probing() {
    let h = harness(vec![ProviderConfig::named("a")]);
    let monitor = HealthMonitor::new(
        h.registry.clone(),
        h.executor.clone(),
        HealthConfig::default(),
    );

    // Before any probe ran, the snapshot returns last known (initial) state.
    let snapshot = monitor.snapshot("a").unwrap();
    assert!(snapshot.available);
    assert_eq!(snapshot.last_probe_at, None);
}

#[tokio::test]
async fn all_providers_unhealthy_reports_circuit_open_trail() {
    let h = harness(vec![fragile_provider("a"), fragile_provider("b")]);
    h.executor.probe_down("a");
    h.executor.probe_down("b");

    let monitor = HealthMonitor::new(
        h.registry.clone(),
        h.executor.clone(),
        HealthConfig::default(),
    );
    monitor.probe_all().await;
    monitor.probe_all().await;

    let err = h
        .router
        .route(ExecutionRequest::new("hello"))
        .await
        .unwrap_err();
    let RouteError::Exhausted { trail } = err else {
        panic!("expected exhaustion");
    };
    assert!(trail
        .iter()
        .all(|o| o.failure == CandidateFailure::CircuitOpen));
    assert!(h.executor.invocations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn probe_loop_runs_on_interval_until_cancelled() {
    let executor = Arc::new(ScriptedExecutor::new());
    let registry = Arc::new(relay::registry::ProviderRegistry::new());
    registry.register(ProviderConfig::named("a")).unwrap();

    let monitor = HealthMonitor::new(
        registry.clone(),
        executor.clone(),
        HealthConfig {
            enabled: true,
            interval_seconds: 1,
            probe_timeout_seconds: 5,
        },
    );

    let token = CancellationToken::new();
    let handle = monitor.start(token.clone());

    // Let a few ticks elapse under the paused clock.
    tokio::time::sleep(std::time::Duration::from_millis(3500)).await;
    token.cancel();
    handle.await.unwrap();

    let provider = registry.get("a").unwrap();
    assert!(provider.last_probe_at.lock().unwrap().is_some());
}
