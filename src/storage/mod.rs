//! Persistence port for usage accounting.
//!
//! Quota counters and cost entries outlive a single process; this module
//! defines the narrow store interface the trackers consume, plus two
//! implementations: an in-memory store for tests and ephemeral deployments,
//! and a JSON file store that survives restarts.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by a usage store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Accumulated usage for one (provider, day-bucket) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub requests: u64,
    pub tokens: u64,
}

/// One recorded spend. Append-only; amounts are validated by the ledger
/// before they reach the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    pub provider: String,
    pub timestamp: DateTime<Utc>,
    pub amount_usd: f64,
}

/// Key-scoped read/increment storage for quota counters and cost entries.
///
/// `quota_add` must be an atomic read-modify-write: concurrent increments to
/// the same key must never lose updates.
#[async_trait]
pub trait UsageStore: Send + Sync + 'static {
    /// Current usage for a (provider, day) key; zero if never written.
    async fn quota_usage(&self, provider: &str, day: NaiveDate)
        -> Result<QuotaUsage, StorageError>;

    /// Atomically add to a (provider, day) key, returning the new totals.
    async fn quota_add(
        &self,
        provider: &str,
        day: NaiveDate,
        requests: u64,
        tokens: u64,
    ) -> Result<QuotaUsage, StorageError>;

    /// Append one cost entry.
    async fn cost_append(&self, entry: CostEntry) -> Result<(), StorageError>;

    /// Sum of recorded cost for a provider at or after `since`.
    async fn cost_since(&self, provider: &str, since: DateTime<Utc>) -> Result<f64, StorageError>;
}
