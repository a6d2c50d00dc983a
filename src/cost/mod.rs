//! Monetary cost tracking and budget enforcement.
//!
//! Costs are append-only entries over the persistence port, aggregated into
//! windowed totals per provider. Bad values are rejected at insertion time:
//! a single NaN would corrupt every subsequent aggregate read.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::registry::ProviderRegistry;
use crate::storage::{CostEntry, StorageError, UsageStore};

/// Errors from cost recording.
#[derive(Debug, Error)]
pub enum CostError {
    /// The amount failed numeric validation; nothing was written
    #[error("cost amount must be a finite, non-negative value, got {value}")]
    InvalidCost { value: f64 },

    #[error(transparent)]
    Store(#[from] StorageError),
}

/// Accumulates spend per provider and enforces configured budgets.
pub struct CostLedger {
    store: Arc<dyn UsageStore>,
    registry: Arc<ProviderRegistry>,
}

impl CostLedger {
    pub fn new(store: Arc<dyn UsageStore>, registry: Arc<ProviderRegistry>) -> Self {
        Self { store, registry }
    }

    /// Record a spend for a provider.
    ///
    /// NaN, infinite, and negative amounts are rejected with
    /// [`CostError::InvalidCost`] before the store is touched.
    pub async fn record(&self, provider: &str, amount_usd: f64) -> Result<(), CostError> {
        if !amount_usd.is_finite() || amount_usd < 0.0 {
            return Err(CostError::InvalidCost { value: amount_usd });
        }

        self.store
            .cost_append(CostEntry {
                provider: provider.to_string(),
                timestamp: Utc::now(),
                amount_usd,
            })
            .await?;

        tracing::debug!(
            provider = provider,
            amount_usd = amount_usd,
            "Recorded cost"
        );
        Ok(())
    }

    /// Total recorded spend for a provider at or after `since`.
    pub async fn total_since(
        &self,
        provider: &str,
        since: DateTime<Utc>,
    ) -> Result<f64, StorageError> {
        self.store.cost_since(provider, since).await
    }

    /// Whether the provider is within its configured budget window.
    ///
    /// Providers without a configured budget are always within budget. Store
    /// read failures fail open with a warning; cost data being momentarily
    /// unreadable must not take the provider out of rotation.
    pub async fn within_budget(&self, provider: &str) -> bool {
        let Some(entry) = self.registry.get(provider) else {
            return true;
        };
        let Some(budget) = entry.cost_budget else {
            return true;
        };

        let window_start = Utc::now() - Duration::seconds(budget.window_seconds as i64);
        match self.total_since(provider, window_start).await {
            Ok(total) => total < budget.amount_usd,
            Err(err) => {
                tracing::warn!(
                    provider = provider,
                    error = %err,
                    "Cost store read failed, treating provider as within budget"
                );
                true
            }
        }
    }
}
