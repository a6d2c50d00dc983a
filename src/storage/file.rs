//! JSON file usage store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{CostEntry, QuotaUsage, StorageError, UsageStore};

/// Serialized store contents.
#[derive(Debug, Default, Serialize, Deserialize)]
struct FileState {
    /// Keyed "provider|YYYY-MM-DD"
    quota: HashMap<String, QuotaUsage>,
    costs: Vec<CostEntry>,
}

/// Usage store persisted to a single JSON file.
///
/// State is held in memory behind one async mutex; every mutation is flushed
/// by writing a sibling temp file and renaming it over the target, so a crash
/// mid-write never leaves a torn file. Suitable for the single-process
/// deployments this engine targets, not for sharing a file between processes.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<FileState>,
}

impl JsonFileStore {
    /// Open the store, loading existing contents if the file is present.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => FileState::default(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    fn quota_key(provider: &str, day: NaiveDate) -> String {
        format!("{}|{}", provider, day.format("%Y-%m-%d"))
    }

    async fn flush(&self, state: &FileState) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(state)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl UsageStore for JsonFileStore {
    async fn quota_usage(
        &self,
        provider: &str,
        day: NaiveDate,
    ) -> Result<QuotaUsage, StorageError> {
        let state = self.state.lock().await;
        Ok(state
            .quota
            .get(&Self::quota_key(provider, day))
            .copied()
            .unwrap_or_default())
    }

    async fn quota_add(
        &self,
        provider: &str,
        day: NaiveDate,
        requests: u64,
        tokens: u64,
    ) -> Result<QuotaUsage, StorageError> {
        let mut state = self.state.lock().await;
        let entry = state
            .quota
            .entry(Self::quota_key(provider, day))
            .or_default();
        entry.requests += requests;
        entry.tokens += tokens;
        let updated = *entry;
        self.flush(&state).await?;
        Ok(updated)
    }

    async fn cost_append(&self, entry: CostEntry) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;
        state.costs.push(entry);
        self.flush(&state).await
    }

    async fn cost_since(&self, provider: &str, since: DateTime<Utc>) -> Result<f64, StorageError> {
        let state = self.state.lock().await;
        Ok(state
            .costs
            .iter()
            .filter(|e| e.provider == provider && e.timestamp >= since)
            .map(|e| e.amount_usd)
            .sum())
    }
}
