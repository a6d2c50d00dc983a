//! Per-provider configuration

use serde::{Deserialize, Serialize};

use crate::breaker::BreakerConfig;

/// Static configuration for a single provider.
///
/// The dispatch core assumes these values were validated by the loader
/// (non-negative, finite); only runtime usage values are re-validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Unique provider name
    pub name: String,
    /// Routing priority (lower = tried first)
    #[serde(default = "default_priority")]
    pub priority: i32,
    /// Per-attempt timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Whether the provider participates in routing
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Daily free allowance; absent means unrestricted
    #[serde(default)]
    pub free_quota: Option<FreeQuota>,
    /// Spending ceiling per window; absent means no budget enforcement
    #[serde(default)]
    pub cost_budget: Option<CostBudget>,
    /// Token pricing; absent means cost is not computable for this provider
    #[serde(default)]
    pub pricing: Option<ProviderPricing>,
    /// Circuit breaker thresholds
    #[serde(default)]
    pub circuit_breaker: BreakerConfig,
}

impl ProviderConfig {
    /// Minimal configuration for a named provider; everything else defaulted.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: default_priority(),
            timeout_seconds: default_timeout_seconds(),
            enabled: default_enabled(),
            free_quota: None,
            cost_budget: None,
            pricing: None,
            circuit_breaker: BreakerConfig::default(),
        }
    }
}

fn default_priority() -> i32 {
    50
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_enabled() -> bool {
    true
}

/// Free daily allowance of requests and tokens.
///
/// `None` on either axis means that axis is unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FreeQuota {
    pub requests_per_day: Option<u64>,
    pub tokens_per_day: Option<u64>,
}

/// Spending ceiling over a rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBudget {
    /// Maximum spend in USD within the window
    pub amount_usd: f64,
    /// Window length in seconds
    pub window_seconds: u64,
}

/// Token pricing for cost estimation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProviderPricing {
    /// Price per 1M input tokens (USD)
    pub input_cost_per_million: f64,
    /// Price per 1M output tokens (USD)
    pub output_cost_per_million: f64,
}

impl ProviderPricing {
    /// Zero-cost pricing for local executors
    pub const LOCAL: ProviderPricing = ProviderPricing {
        input_cost_per_million: 0.0,
        output_cost_per_million: 0.0,
    };

    /// Estimated cost in USD for the given token counts.
    pub fn cost_usd(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (self.input_cost_per_million * input_tokens as f64 / 1_000_000.0)
            + (self.output_cost_per_million * output_tokens as f64 / 1_000_000.0)
    }
}
