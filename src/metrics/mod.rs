//! # Metrics Collection Module
//!
//! Prometheus-facade metrics for the dispatch pipeline.
//!
//! ## Metrics Tracked
//!
//! **Counters:**
//! - `relay_requests_total{status}` - Route calls by final status
//! - `relay_attempts_total{provider, outcome}` - Provider attempts
//! - `relay_rejections_total{provider, reason}` - Candidates excluded before attempt
//! - `relay_circuit_transitions_total{provider, to}` - Breaker transitions
//!
//! **Histograms:**
//! - `relay_attempt_duration_seconds{provider}` - Attempt duration
//! - `relay_probe_latency_seconds{provider}` - Health probe latency
//!
//! **Gauges:**
//! - `relay_providers_total` - Registered providers
//! - `relay_providers_available` - Providers whose last probe succeeded

// Re-export so embedders and tests can install a recorder without a direct
// dependency on the exporter crate.
pub use metrics_exporter_prometheus::PrometheusBuilder;

use std::sync::atomic::Ordering;

use crate::registry::ProviderRegistry;

/// Record the final status of a route call ("success" or "exhausted").
pub fn record_route(status: &str) {
    metrics::counter!("relay_requests_total", "status" => status.to_string()).increment(1);
}

/// Record one provider attempt and its duration.
pub fn record_attempt(provider: &str, outcome: &str, duration_secs: f64) {
    metrics::counter!(
        "relay_attempts_total",
        "provider" => provider.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "relay_attempt_duration_seconds",
        "provider" => provider.to_string()
    )
    .record(duration_secs);
}

/// Record a candidate excluded before any attempt.
pub fn record_rejection(provider: &str, reason: &str) {
    metrics::counter!(
        "relay_rejections_total",
        "provider" => provider.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Record a circuit breaker transition.
pub fn record_circuit_transition(provider: &str, to: &str) {
    metrics::counter!(
        "relay_circuit_transitions_total",
        "provider" => provider.to_string(),
        "to" => to.to_string()
    )
    .increment(1);
}

/// Record a health probe's observed latency.
pub fn record_probe_latency(provider: &str, latency_secs: f64) {
    metrics::histogram!(
        "relay_probe_latency_seconds",
        "provider" => provider.to_string()
    )
    .record(latency_secs);
}

/// Update provider fleet gauges from the registry.
pub fn update_provider_gauges(registry: &ProviderRegistry) {
    let providers = registry.all();
    metrics::gauge!("relay_providers_total").set(providers.len() as f64);

    let available = providers
        .iter()
        .filter(|p| p.available.load(Ordering::SeqCst))
        .count();
    metrics::gauge!("relay_providers_available").set(available as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;

    #[test]
    fn recording_without_installed_recorder_is_a_noop() {
        // The metrics facade drops samples when no recorder is installed;
        // these must never panic in that configuration.
        record_route("success");
        record_attempt("claude", "failure", 0.25);
        record_rejection("claude", "quota");
        record_circuit_transition("claude", "open");
        record_probe_latency("claude", 0.01);

        let registry = ProviderRegistry::new();
        registry.register(ProviderConfig::named("claude")).unwrap();
        update_provider_gauges(&registry);
    }
}
