//! Provider registry.
//!
//! Thread-safe arena of provider records, keyed by name. Each entry carries
//! its own circuit breaker and counters; all mutation of a provider's
//! runtime state funnels through registry methods so concurrent routing
//! calls and the health monitor never lose updates.

mod error;
mod provider;

pub use error::RegistryError;
pub use provider::{Provider, ProviderView};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::breaker::{CircuitState, Transition};
use crate::config::ProviderConfig;

/// Registry of providers eligible for dispatch.
///
/// # Examples
///
/// ```
/// use relay::config::ProviderConfig;
/// use relay::registry::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// registry.register(ProviderConfig::named("claude")).unwrap();
/// assert_eq!(registry.count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: DashMap<String, Arc<Provider>>,
    next_order: AtomicUsize,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated from configuration, preserving
    /// declaration order for tie-breaking.
    pub fn from_configs(
        configs: impl IntoIterator<Item = ProviderConfig>,
    ) -> Result<Self, RegistryError> {
        let registry = Self::new();
        for config in configs {
            registry.register(config)?;
        }
        Ok(registry)
    }

    /// Register a provider.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateProvider`] if the name is taken.
    pub fn register(&self, config: ProviderConfig) -> Result<(), RegistryError> {
        let name = config.name.clone();
        if self.providers.contains_key(&name) {
            return Err(RegistryError::DuplicateProvider(name));
        }
        let order = self.next_order.fetch_add(1, Ordering::SeqCst);
        self.providers
            .insert(name, Arc::new(Provider::from_config(config, order)));
        Ok(())
    }

    /// Remove a provider.
    pub fn remove(&self, name: &str) -> Result<Arc<Provider>, RegistryError> {
        self.providers
            .remove(name)
            .map(|(_, provider)| provider)
            .ok_or_else(|| RegistryError::ProviderNotFound(name.to_string()))
    }

    /// Look up a provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<Provider>> {
        self.providers.get(name).map(|entry| entry.value().clone())
    }

    /// All providers in declaration order.
    pub fn all(&self) -> Vec<Arc<Provider>> {
        let mut providers: Vec<_> = self
            .providers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        providers.sort_by_key(|p| p.order);
        providers
    }

    /// Number of registered providers.
    pub fn count(&self) -> usize {
        self.providers.len()
    }

    /// Serializable snapshots of all providers, in declaration order.
    pub fn views(&self) -> Vec<ProviderView> {
        self.all().iter().map(|p| ProviderView::from(&**p)).collect()
    }

    /// Take a breaker permit for one attempt against this provider.
    ///
    /// Returns whether the attempt is admitted, plus the circuit transition
    /// (open -> half-open) if taking the permit caused one.
    pub fn try_acquire(
        &self,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<(bool, Option<Transition>), RegistryError> {
        let provider = self
            .get(name)
            .ok_or_else(|| RegistryError::ProviderNotFound(name.to_string()))?;
        let mut breaker = provider.breaker.lock().unwrap();
        let before = breaker.state();
        let admitted = breaker.try_acquire(now);
        let after = breaker.state();
        Ok((admitted, transition(before, after)))
    }

    /// Record a successful attempt: clears the failure streak, feeds the
    /// latency EMA, and reports any circuit transition (half-open -> closed).
    pub fn record_success(
        &self,
        name: &str,
        latency_ms: u32,
    ) -> Result<Option<Transition>, RegistryError> {
        let provider = self
            .get(name)
            .ok_or_else(|| RegistryError::ProviderNotFound(name.to_string()))?;

        provider.consecutive_failures.store(0, Ordering::SeqCst);
        update_latency(&provider, latency_ms);

        let mut breaker = provider.breaker.lock().unwrap();
        let before = breaker.state();
        breaker.on_success();
        let after = breaker.state();
        Ok(transition(before, after))
    }

    /// Record a failed or timed-out attempt, reporting any circuit
    /// transition (closed/half-open -> open).
    pub fn record_failure(
        &self,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Transition>, RegistryError> {
        let provider = self
            .get(name)
            .ok_or_else(|| RegistryError::ProviderNotFound(name.to_string()))?;

        provider.consecutive_failures.fetch_add(1, Ordering::SeqCst);

        let mut breaker = provider.breaker.lock().unwrap();
        let before = breaker.state();
        breaker.on_failure(now);
        let after = breaker.state();
        Ok(transition(before, after))
    }

    /// Apply a health probe outcome: availability flag, probe timestamp,
    /// latency (on success), and the breaker.
    pub fn apply_probe(
        &self,
        name: &str,
        available: bool,
        latency_ms: Option<u32>,
        at: DateTime<Utc>,
    ) -> Result<Option<Transition>, RegistryError> {
        let provider = self
            .get(name)
            .ok_or_else(|| RegistryError::ProviderNotFound(name.to_string()))?;

        provider.available.store(available, Ordering::SeqCst);
        *provider.last_probe_at.lock().unwrap() = Some(at);

        if available {
            provider.consecutive_failures.store(0, Ordering::SeqCst);
            if let Some(latency_ms) = latency_ms {
                update_latency(&provider, latency_ms);
            }
            let mut breaker = provider.breaker.lock().unwrap();
            let before = breaker.state();
            breaker.on_success();
            Ok(transition(before, breaker.state()))
        } else {
            provider.consecutive_failures.fetch_add(1, Ordering::SeqCst);
            let mut breaker = provider.breaker.lock().unwrap();
            let before = breaker.state();
            breaker.on_failure(at);
            Ok(transition(before, breaker.state()))
        }
    }

    /// Current circuit state of a provider.
    pub fn circuit_state(&self, name: &str) -> Result<CircuitState, RegistryError> {
        let provider = self
            .get(name)
            .ok_or_else(|| RegistryError::ProviderNotFound(name.to_string()))?;
        Ok(provider.circuit_state())
    }
}

fn transition(before: CircuitState, after: CircuitState) -> Option<Transition> {
    (before != after).then_some((before, after))
}

/// Update rolling average latency using EMA: new = (sample + 4*old) / 5.
///
/// Integer math with alpha=0.2. First sample sets the initial value.
fn update_latency(provider: &Provider, latency_ms: u32) {
    loop {
        let current = provider.avg_latency_ms.load(Ordering::SeqCst);
        let new_val = if current == 0 {
            latency_ms
        } else {
            (latency_ms + 4 * current) / 5
        };
        match provider.avg_latency_ms.compare_exchange(
            current,
            new_val,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => return,
            Err(_) => continue,
        }
    }
}
