//! Provider records: static configuration plus runtime health state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::breaker::{CircuitBreaker, CircuitState};
use crate::config::{CostBudget, FreeQuota, ProviderConfig, ProviderPricing};

/// A registered task executor provider.
///
/// Static routing configuration plus runtime state. Runtime fields are
/// mutated only through [`super::ProviderRegistry`] methods, so every update
/// to a single provider serializes on that entry; routing reads them as
/// eventually-consistent snapshots.
#[derive(Debug)]
pub struct Provider {
    /// Unique provider name
    pub name: String,
    /// Routing priority (lower = tried first)
    pub priority: i32,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Whether the provider participates in routing
    pub enabled: bool,
    /// Daily free allowance; absent means unrestricted
    pub free_quota: Option<FreeQuota>,
    /// Spending ceiling per window; absent means no budget enforcement
    pub cost_budget: Option<CostBudget>,
    /// Token pricing; absent means cost is not computable
    pub pricing: Option<ProviderPricing>,
    /// Declaration order, the final routing tie-break
    pub order: usize,
    /// Failure-rate state machine for this provider
    pub breaker: Mutex<CircuitBreaker>,
    /// Last probe verdict from the health monitor
    pub available: AtomicBool,
    /// Consecutive failed attempts/probes
    pub consecutive_failures: AtomicU32,
    /// Rolling average latency in milliseconds (EMA, alpha 0.2)
    pub avg_latency_ms: AtomicU32,
    /// When the health monitor last probed this provider
    pub last_probe_at: Mutex<Option<DateTime<Utc>>>,
}

impl Provider {
    /// Build a provider entry from its configuration.
    ///
    /// Providers start optimistically available with a closed breaker; the
    /// first probe cycle corrects the availability flag if needed.
    pub fn from_config(config: ProviderConfig, order: usize) -> Self {
        Self {
            name: config.name,
            priority: config.priority,
            timeout: Duration::from_secs(config.timeout_seconds),
            enabled: config.enabled,
            free_quota: config.free_quota,
            cost_budget: config.cost_budget,
            pricing: config.pricing,
            order,
            breaker: Mutex::new(CircuitBreaker::new(config.circuit_breaker)),
            available: AtomicBool::new(true),
            consecutive_failures: AtomicU32::new(0),
            avg_latency_ms: AtomicU32::new(0),
            last_probe_at: Mutex::new(None),
        }
    }

    /// Current circuit state. Read-only; does not advance open -> half-open.
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.lock().unwrap().state()
    }
}

/// Serializable view of a provider (atomics and locks flattened to values).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderView {
    pub name: String,
    pub priority: i32,
    pub timeout_seconds: u64,
    pub enabled: bool,
    pub available: bool,
    pub circuit_state: CircuitState,
    pub consecutive_failures: u32,
    pub avg_latency_ms: u32,
    pub last_probe_at: Option<DateTime<Utc>>,
}

impl From<&Provider> for ProviderView {
    fn from(provider: &Provider) -> Self {
        Self {
            name: provider.name.clone(),
            priority: provider.priority,
            timeout_seconds: provider.timeout.as_secs(),
            enabled: provider.enabled,
            available: provider.available.load(Ordering::SeqCst),
            circuit_state: provider.circuit_state(),
            consecutive_failures: provider.consecutive_failures.load(Ordering::SeqCst),
            avg_latency_ms: provider.avg_latency_ms.load(Ordering::SeqCst),
            last_probe_at: *provider.last_probe_at.lock().unwrap(),
        }
    }
}
