//! Health monitoring for registered providers.
//!
//! A background loop periodically probes each provider's availability
//! through the executor port, feeding the result into the provider's
//! availability flag and circuit breaker. Routing reads the last known state
//! via [`HealthMonitor::snapshot`], which never blocks and never waits for a
//! fresh probe.

mod config;

pub use config::HealthConfig;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::breaker::CircuitState;
use crate::events::{DispatchEvent, EventBus};
use crate::executor::{ExecutorError, TaskExecutor};
use crate::registry::ProviderRegistry;

/// Last known health of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub available: bool,
    pub circuit_state: CircuitState,
    pub last_probe_at: Option<DateTime<Utc>>,
    pub avg_latency_ms: u32,
}

/// Outcome of probing one provider.
#[derive(Debug, Clone)]
pub enum ProbeResult {
    Success { latency_ms: u32 },
    Failure { error: ExecutorError },
}

/// Background service that periodically probes provider availability.
pub struct HealthMonitor {
    registry: Arc<ProviderRegistry>,
    executor: Arc<dyn TaskExecutor>,
    config: HealthConfig,
    events: EventBus,
}

impl HealthMonitor {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        executor: Arc<dyn TaskExecutor>,
        config: HealthConfig,
    ) -> Self {
        Self {
            registry,
            executor,
            config,
            events: EventBus::default(),
        }
    }

    /// Use a shared event bus instead of a private one.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Probe a single provider, bounded by the probe timeout.
    pub async fn probe_provider(&self, name: &str) -> ProbeResult {
        let timeout = Duration::from_secs(self.config.probe_timeout_seconds);
        let start = Instant::now();

        match tokio::time::timeout(timeout, self.executor.probe(name)).await {
            Ok(Ok(())) => ProbeResult::Success {
                latency_ms: start.elapsed().as_millis() as u32,
            },
            Ok(Err(error)) => ProbeResult::Failure { error },
            Err(_) => ProbeResult::Failure {
                error: ExecutorError::Timeout(timeout.as_millis() as u64),
            },
        }
    }

    /// Apply a probe result to the registry and emit any circuit transition.
    ///
    /// Probe failures are never escalated; they only shape future routing.
    pub fn apply_result(&self, name: &str, result: &ProbeResult) {
        let now = Utc::now();
        let applied = match result {
            ProbeResult::Success { latency_ms } => {
                crate::metrics::record_probe_latency(name, *latency_ms as f64 / 1000.0);
                self.registry.apply_probe(name, true, Some(*latency_ms), now)
            }
            ProbeResult::Failure { error } => {
                tracing::debug!(provider = name, error = %error, "Health probe failed");
                self.registry.apply_probe(name, false, None, now)
            }
        };

        match applied {
            Ok(Some((from, to))) => {
                tracing::info!(
                    provider = name,
                    from = %from,
                    to = %to,
                    "Circuit state changed from health probe"
                );
                crate::metrics::record_circuit_transition(name, &to.to_string());
                self.events.emit(DispatchEvent::CircuitTransition {
                    provider: name.to_string(),
                    from,
                    to,
                });
            }
            Ok(None) => {}
            Err(err) => {
                // Provider was removed between probe and apply; nothing to do.
                tracing::debug!(provider = name, error = %err, "Skipping probe result");
            }
        }
    }

    /// Probe every registered provider once.
    pub async fn probe_all(&self) -> Vec<(String, ProbeResult)> {
        let providers = self.registry.all();
        let mut results = Vec::with_capacity(providers.len());

        for provider in providers {
            let result = self.probe_provider(&provider.name).await;
            self.apply_result(&provider.name, &result);
            results.push((provider.name.clone(), result));
        }

        crate::metrics::update_provider_gauges(&self.registry);
        results
    }

    /// Last known health of a provider. Non-blocking; returns stale state
    /// rather than waiting for a probe.
    pub fn snapshot(&self, name: &str) -> Option<HealthSnapshot> {
        let provider = self.registry.get(name)?;
        let last_probe_at = *provider.last_probe_at.lock().unwrap();
        Some(HealthSnapshot {
            available: provider.available.load(Ordering::SeqCst),
            circuit_state: provider.circuit_state(),
            last_probe_at,
            avg_latency_ms: provider.avg_latency_ms.load(Ordering::SeqCst),
        })
    }

    /// Start the probe loop. Returns a handle that resolves when the loop
    /// stops; cancel via the token.
    pub fn start(self, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            if !self.config.enabled {
                tracing::info!("Health monitor disabled by configuration");
                return;
            }

            let mut interval =
                tokio::time::interval(Duration::from_secs(self.config.interval_seconds));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            tracing::info!(
                interval_seconds = self.config.interval_seconds,
                "Health monitor started"
            );

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::info!("Health monitor shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let results = self.probe_all().await;
                        tracing::debug!(
                            providers_probed = results.len(),
                            "Health probe cycle completed"
                        );
                    }
                }
            }
        })
    }
}
