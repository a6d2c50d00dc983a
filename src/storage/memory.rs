//! In-memory usage store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use std::sync::Mutex;

use super::{CostEntry, QuotaUsage, StorageError, UsageStore};

/// Process-local store backed by concurrent maps.
///
/// Increments are atomic per key via the map's entry lock. Contents do not
/// survive a restart; use [`super::JsonFileStore`] where durability matters.
#[derive(Debug, Default)]
pub struct MemoryStore {
    quota: DashMap<(String, NaiveDate), QuotaUsage>,
    costs: Mutex<Vec<CostEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageStore for MemoryStore {
    async fn quota_usage(
        &self,
        provider: &str,
        day: NaiveDate,
    ) -> Result<QuotaUsage, StorageError> {
        Ok(self
            .quota
            .get(&(provider.to_string(), day))
            .map(|entry| *entry.value())
            .unwrap_or_default())
    }

    async fn quota_add(
        &self,
        provider: &str,
        day: NaiveDate,
        requests: u64,
        tokens: u64,
    ) -> Result<QuotaUsage, StorageError> {
        let mut entry = self.quota.entry((provider.to_string(), day)).or_default();
        entry.requests += requests;
        entry.tokens += tokens;
        Ok(*entry)
    }

    async fn cost_append(&self, entry: CostEntry) -> Result<(), StorageError> {
        self.costs.lock().unwrap().push(entry);
        Ok(())
    }

    async fn cost_since(&self, provider: &str, since: DateTime<Utc>) -> Result<f64, StorageError> {
        Ok(self
            .costs
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.provider == provider && e.timestamp >= since)
            .map(|e| e.amount_usd)
            .sum())
    }
}
