//! Free-tier quota tracking.
//!
//! Per-provider, per-day request/token counters against a configured free
//! allowance. Counters live behind the persistence port; the day bucket
//! rolls over lazily at the configured UTC hour, so reads after the boundary
//! see zero usage without an explicit reset pass.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::registry::ProviderRegistry;
use crate::storage::{StorageError, UsageStore};

/// Quota day-bucket configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// UTC hour at which daily counters reset (0 = midnight UTC)
    pub reset_hour_utc: u8,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self { reset_hour_utc: 0 }
    }
}

/// Errors from quota recording.
#[derive(Debug, Error)]
pub enum QuotaError {
    /// A usage value failed numeric validation; nothing was written
    #[error("usage value for {field} must be non-negative, got {value}")]
    InvalidUsage { field: &'static str, value: i64 },

    #[error(transparent)]
    Store(#[from] StorageError),
}

/// What remains of a provider's free allowance today.
///
/// `None` on a remaining axis means that axis is unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaAvailability {
    pub available: bool,
    pub requests_remaining: Option<u64>,
    pub tokens_remaining: Option<u64>,
}

impl QuotaAvailability {
    /// Availability for a provider with no configured free tier.
    pub fn unrestricted() -> Self {
        Self {
            available: true,
            requests_remaining: None,
            tokens_remaining: None,
        }
    }
}

/// Tracks daily free-tier consumption per provider.
pub struct QuotaTracker {
    store: Arc<dyn UsageStore>,
    registry: Arc<ProviderRegistry>,
    config: QuotaConfig,
}

impl QuotaTracker {
    pub fn new(
        store: Arc<dyn UsageStore>,
        registry: Arc<ProviderRegistry>,
        config: QuotaConfig,
    ) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    /// The day bucket `now` falls into, honoring the configured reset hour.
    pub fn day_bucket(&self, now: DateTime<Utc>) -> NaiveDate {
        (now - Duration::hours(self.config.reset_hour_utc as i64)).date_naive()
    }

    /// Record consumed usage.
    ///
    /// Validation happens before any write: negative values are rejected
    /// atomically with [`QuotaError::InvalidUsage`] naming the offending
    /// field, leaving stored usage untouched. Values are never coerced.
    pub async fn record(
        &self,
        provider: &str,
        requests: i64,
        tokens: i64,
    ) -> Result<(), QuotaError> {
        if requests < 0 {
            return Err(QuotaError::InvalidUsage {
                field: "requests",
                value: requests,
            });
        }
        if tokens < 0 {
            return Err(QuotaError::InvalidUsage {
                field: "tokens",
                value: tokens,
            });
        }

        let day = self.day_bucket(Utc::now());
        let usage = self
            .store
            .quota_add(provider, day, requests as u64, tokens as u64)
            .await?;

        tracing::debug!(
            provider = provider,
            requests_used = usage.requests,
            tokens_used = usage.tokens,
            "Recorded quota usage"
        );
        Ok(())
    }

    /// What remains of today's free allowance.
    ///
    /// A provider with no configured free tier always reports unrestricted
    /// availability. Store read failures fail open with a warning: stale
    /// quota data must not take an otherwise healthy provider out of
    /// rotation.
    pub async fn has_quota(&self, provider: &str) -> QuotaAvailability {
        let Some(entry) = self.registry.get(provider) else {
            return QuotaAvailability::unrestricted();
        };
        let Some(free_quota) = entry.free_quota else {
            return QuotaAvailability::unrestricted();
        };

        let day = self.day_bucket(Utc::now());
        let usage = match self.store.quota_usage(provider, day).await {
            Ok(usage) => usage,
            Err(err) => {
                tracing::warn!(
                    provider = provider,
                    error = %err,
                    "Quota store read failed, treating provider as within quota"
                );
                return QuotaAvailability::unrestricted();
            }
        };

        let requests_remaining = free_quota
            .requests_per_day
            .map(|limit| limit.saturating_sub(usage.requests));
        let tokens_remaining = free_quota
            .tokens_per_day
            .map(|limit| limit.saturating_sub(usage.tokens));

        let available = requests_remaining.map_or(true, |r| r > 0)
            && tokens_remaining.map_or(true, |t| t > 0);

        QuotaAvailability {
            available,
            requests_remaining,
            tokens_remaining,
        }
    }

    /// Best-effort pre-check: would the allowance cover this much more usage?
    ///
    /// Non-binding; concurrent callers may each see headroom that only one of
    /// them will get. Actual enforcement is the eligibility check plus the
    /// recorded counters.
    pub async fn reserve(&self, provider: &str, requests: u64, tokens: u64) -> bool {
        let availability = self.has_quota(provider).await;
        availability.available
            && availability.requests_remaining.map_or(true, |r| r >= requests)
            && availability.tokens_remaining.map_or(true, |t| t >= tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FreeQuota, ProviderConfig};
    use crate::storage::MemoryStore;

    fn tracker_with(provider: ProviderConfig) -> QuotaTracker {
        let registry = Arc::new(ProviderRegistry::new());
        registry.register(provider).unwrap();
        QuotaTracker::new(
            Arc::new(MemoryStore::new()),
            registry,
            QuotaConfig::default(),
        )
    }

    fn limited_provider(name: &str, requests: u64, tokens: u64) -> ProviderConfig {
        ProviderConfig {
            free_quota: Some(FreeQuota {
                requests_per_day: Some(requests),
                tokens_per_day: Some(tokens),
            }),
            ..ProviderConfig::named(name)
        }
    }

    #[tokio::test]
    async fn provider_without_free_tier_is_unrestricted() {
        let tracker = tracker_with(ProviderConfig::named("claude"));
        let availability = tracker.has_quota("claude").await;
        assert!(availability.available);
        assert_eq!(availability.requests_remaining, None);
        assert_eq!(availability.tokens_remaining, None);
    }

    #[tokio::test]
    async fn usage_reduces_remaining_allowance() {
        let tracker = tracker_with(limited_provider("claude", 10, 1000));
        tracker.record("claude", 3, 400).await.unwrap();

        let availability = tracker.has_quota("claude").await;
        assert!(availability.available);
        assert_eq!(availability.requests_remaining, Some(7));
        assert_eq!(availability.tokens_remaining, Some(600));
    }

    #[tokio::test]
    async fn exhausted_requests_block_availability() {
        let tracker = tracker_with(limited_provider("claude", 2, 1_000_000));
        tracker.record("claude", 2, 10).await.unwrap();

        let availability = tracker.has_quota("claude").await;
        assert!(!availability.available);
        assert_eq!(availability.requests_remaining, Some(0));
    }

    #[tokio::test]
    async fn exhausted_tokens_block_availability() {
        let tracker = tracker_with(limited_provider("claude", 100, 500));
        tracker.record("claude", 1, 500).await.unwrap();

        let availability = tracker.has_quota("claude").await;
        assert!(!availability.available);
        assert_eq!(availability.tokens_remaining, Some(0));
    }

    #[tokio::test]
    async fn negative_requests_rejected_without_partial_write() {
        let tracker = tracker_with(limited_provider("claude", 10, 1000));
        tracker.record("claude", 1, 100).await.unwrap();
        let before = tracker.has_quota("claude").await;

        let err = tracker.record("claude", -5, 100).await.unwrap_err();
        assert!(matches!(
            err,
            QuotaError::InvalidUsage {
                field: "requests",
                value: -5
            }
        ));
        assert!(err.to_string().contains("requests"));
        assert!(err.to_string().contains("-5"));

        // Idempotent on failure: remaining quota unchanged.
        assert_eq!(tracker.has_quota("claude").await, before);
    }

    #[tokio::test]
    async fn negative_tokens_rejected() {
        let tracker = tracker_with(limited_provider("claude", 10, 1000));
        let err = tracker.record("claude", 1, -1).await.unwrap_err();
        assert!(matches!(
            err,
            QuotaError::InvalidUsage {
                field: "tokens",
                value: -1
            }
        ));
    }

    #[tokio::test]
    async fn day_bucket_honors_reset_hour() {
        let registry = Arc::new(ProviderRegistry::new());
        let tracker = QuotaTracker::new(
            Arc::new(MemoryStore::new()),
            registry,
            QuotaConfig { reset_hour_utc: 6 },
        );

        let before_reset = "2026-08-07T05:59:00Z".parse::<DateTime<Utc>>().unwrap();
        let after_reset = "2026-08-07T06:01:00Z".parse::<DateTime<Utc>>().unwrap();

        // Before 06:00 UTC still counts against the previous day.
        assert_eq!(
            tracker.day_bucket(before_reset),
            NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
        );
        assert_eq!(
            tracker.day_bucket(after_reset),
            NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
        );
    }

    #[tokio::test]
    async fn usage_in_older_bucket_is_invisible_today() {
        // Lazy rollover: usage recorded under yesterday's key is simply not
        // read once the bucket advances; no reset call is needed.
        let registry = Arc::new(ProviderRegistry::new());
        registry
            .register(limited_provider("claude", 5, 1000))
            .unwrap();
        let store = Arc::new(MemoryStore::new());
        let tracker = QuotaTracker::new(store.clone(), registry, QuotaConfig::default());

        let yesterday = tracker.day_bucket(Utc::now() - Duration::days(1));
        store.quota_add("claude", yesterday, 5, 1000).await.unwrap();

        let availability = tracker.has_quota("claude").await;
        assert!(availability.available);
        assert_eq!(availability.requests_remaining, Some(5));
    }

    #[tokio::test]
    async fn reserve_is_a_best_effort_precheck() {
        let tracker = tracker_with(limited_provider("claude", 10, 1000));
        tracker.record("claude", 8, 0).await.unwrap();

        assert!(tracker.reserve("claude", 2, 100).await);
        assert!(!tracker.reserve("claude", 3, 100).await);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn negative_usage_never_mutates_store(requests in i64::MIN..0, tokens in any::<i64>()) {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .unwrap();
                rt.block_on(async {
                    let tracker = tracker_with(limited_provider("claude", 10, 1000));
                    let before = tracker.has_quota("claude").await;
                    let _ = tracker.record("claude", requests, tokens).await;
                    prop_assert_eq!(tracker.has_quota("claude").await, before);
                    Ok(())
                })?;
            }
        }
    }
}
