//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use relay::config::ProviderConfig;
use relay::cost::CostLedger;
use relay::executor::{ExecutorError, TaskExecutor};
use relay::quota::{QuotaConfig, QuotaTracker};
use relay::registry::ProviderRegistry;
use relay::routing::Router;
use relay::storage::{MemoryStore, UsageStore};

#[derive(Clone)]
pub enum Behavior {
    Succeed(String),
    Fail(String),
}

/// Scripted executor recording every invocation and probe.
pub struct ScriptedExecutor {
    behaviors: DashMap<String, Behavior>,
    probe_down: DashMap<String, ()>,
    invocations: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self {
            behaviors: DashMap::new(),
            probe_down: DashMap::new(),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn succeed(&self, provider: &str, output: &str) {
        self.behaviors
            .insert(provider.to_string(), Behavior::Succeed(output.to_string()));
    }

    pub fn fail(&self, provider: &str, message: &str) {
        self.behaviors
            .insert(provider.to_string(), Behavior::Fail(message.to_string()));
    }

    pub fn probe_down(&self, provider: &str) {
        self.probe_down.insert(provider.to_string(), ());
    }

    pub fn probe_up(&self, provider: &str) {
        self.probe_down.remove(provider);
    }

    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }
}

impl Default for ScriptedExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskExecutor for ScriptedExecutor {
    async fn invoke(
        &self,
        provider: &str,
        _prompt: &str,
        _timeout: Duration,
    ) -> Result<String, ExecutorError> {
        self.invocations.lock().unwrap().push(provider.to_string());
        let behavior = self
            .behaviors
            .get(provider)
            .map(|b| b.value().clone())
            .ok_or_else(|| ExecutorError::UnknownProvider(provider.to_string()))?;
        match behavior {
            Behavior::Succeed(output) => Ok(output),
            Behavior::Fail(message) => Err(ExecutorError::Failed(message)),
        }
    }

    async fn probe(&self, provider: &str) -> Result<(), ExecutorError> {
        if self.probe_down.contains_key(provider) {
            Err(ExecutorError::Failed("probe refused".to_string()))
        } else {
            Ok(())
        }
    }
}

/// A fully wired router over a scripted executor.
pub struct TestHarness {
    pub router: Router,
    pub registry: Arc<ProviderRegistry>,
    pub executor: Arc<ScriptedExecutor>,
    pub quota: Arc<QuotaTracker>,
    pub costs: Arc<CostLedger>,
}

/// Wire a harness over an in-memory store.
pub fn harness(configs: Vec<ProviderConfig>) -> TestHarness {
    harness_with_store(configs, Arc::new(MemoryStore::new()))
}

/// Wire a harness over any usage store.
pub fn harness_with_store(
    configs: Vec<ProviderConfig>,
    store: Arc<dyn UsageStore>,
) -> TestHarness {
    let registry = Arc::new(ProviderRegistry::from_configs(configs).unwrap());
    let executor = Arc::new(ScriptedExecutor::new());
    let quota = Arc::new(QuotaTracker::new(
        store.clone(),
        registry.clone(),
        QuotaConfig::default(),
    ));
    let costs = Arc::new(CostLedger::new(store, registry.clone()));
    let router = Router::new(
        registry.clone(),
        executor.clone(),
        quota.clone(),
        costs.clone(),
    );
    TestHarness {
        router,
        registry,
        executor,
        quota,
        costs,
    }
}
