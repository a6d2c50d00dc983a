//! Integration tests for quota and cost accounting, including persistence.

mod common;

use common::{harness, harness_with_store};
use std::sync::Arc;

use relay::config::{CostBudget, FreeQuota, ProviderConfig};
use relay::quota::QuotaError;
use relay::storage::JsonFileStore;
use relay::workload::ExecutionRequest;

fn quota_provider(name: &str, requests: u64, tokens: u64) -> ProviderConfig {
    ProviderConfig {
        free_quota: Some(FreeQuota {
            requests_per_day: Some(requests),
            tokens_per_day: Some(tokens),
        }),
        ..ProviderConfig::named(name)
    }
}

#[tokio::test]
async fn invalid_usage_leaves_quota_unchanged() {
    let h = harness(vec![quota_provider("p1", 100, 100_000)]);
    h.quota.record("p1", 4, 500).await.unwrap();
    let before = h.quota.has_quota("p1").await;

    let err = h.quota.record("p1", -5, 100).await.unwrap_err();
    assert!(matches!(
        err,
        QuotaError::InvalidUsage {
            field: "requests",
            value: -5
        }
    ));

    assert_eq!(h.quota.has_quota("p1").await, before);
}

#[tokio::test]
async fn quota_exhaustion_removes_provider_until_rollover() {
    let h = harness(vec![quota_provider("a", 2, 1_000_000)]);
    h.executor.succeed("a", "ok");

    for _ in 0..2 {
        h.router
            .route(ExecutionRequest::new("hello"))
            .await
            .unwrap();
    }

    // Allowance spent: third call finds no eligible candidate.
    let err = h
        .router
        .route(ExecutionRequest::new("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, relay::routing::RouteError::Exhausted { .. }));
    assert_eq!(h.executor.invocations().len(), 2);
}

#[tokio::test]
async fn quota_counters_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("usage.json");

    {
        let store = Arc::new(JsonFileStore::open(&path).await.unwrap());
        let h = harness_with_store(vec![quota_provider("claude", 10, 100_000)], store);
        h.quota.record("claude", 7, 5_000).await.unwrap();
    }

    // New process, same file: usage is still visible.
    let store = Arc::new(JsonFileStore::open(&path).await.unwrap());
    let h = harness_with_store(vec![quota_provider("claude", 10, 100_000)], store);
    let availability = h.quota.has_quota("claude").await;
    assert_eq!(availability.requests_remaining, Some(3));
    assert_eq!(availability.tokens_remaining, Some(95_000));
}

#[tokio::test]
async fn budget_enforcement_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("usage.json");
    let budgeted = ProviderConfig {
        cost_budget: Some(CostBudget {
            amount_usd: 1.0,
            window_seconds: 86_400,
        }),
        ..ProviderConfig::named("claude")
    };

    {
        let store = Arc::new(JsonFileStore::open(&path).await.unwrap());
        let h = harness_with_store(vec![budgeted.clone()], store);
        h.costs.record("claude", 1.5).await.unwrap();
        assert!(!h.costs.within_budget("claude").await);
    }

    let store = Arc::new(JsonFileStore::open(&path).await.unwrap());
    let h = harness_with_store(vec![budgeted], store);
    assert!(!h.costs.within_budget("claude").await);
}

#[tokio::test]
async fn reserve_reflects_remaining_allowance() {
    let h = harness(vec![quota_provider("a", 5, 1_000)]);
    h.quota.record("a", 4, 900).await.unwrap();

    assert!(h.quota.reserve("a", 1, 100).await);
    assert!(!h.quota.reserve("a", 2, 100).await);
    assert!(!h.quota.reserve("a", 1, 200).await);
}

#[tokio::test]
async fn unpriced_provider_records_no_cost() {
    let h = harness(vec![ProviderConfig::named("local")]);
    h.executor.succeed("local", "ok");

    h.router
        .route(ExecutionRequest::new("hello"))
        .await
        .unwrap();

    let total = h
        .costs
        .total_since("local", chrono::Utc::now() - chrono::Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(total, 0.0);
}
