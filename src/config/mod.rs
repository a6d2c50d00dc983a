//! Configuration structures for the dispatch core
//!
//! This crate does not load configuration files; embedders parse TOML (or
//! any serde format) into these structures and hand them in already
//! validated. Only runtime usage values are re-validated by the core.
//!
//! # Example
//!
//! ```rust
//! use relay::config::DispatchConfig;
//!
//! let toml = r#"
//! [[providers]]
//! name = "claude"
//! priority = 1
//!
//! [[providers]]
//! name = "gemini"
//! priority = 2
//!
//! [health]
//! interval_seconds = 60
//! "#;
//! let config: DispatchConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.providers.len(), 2);
//! assert_eq!(config.health.interval_seconds, 60);
//! ```

pub mod logging;
pub mod provider;

pub use logging::{LogFormat, LoggingConfig};
pub use provider::{CostBudget, FreeQuota, ProviderConfig, ProviderPricing};

// Re-exports from the modules that own these sections
pub use crate::breaker::BreakerConfig;
pub use crate::health::HealthConfig;
pub use crate::quota::QuotaConfig;

use serde::{Deserialize, Serialize};

/// Aggregated configuration for a dispatch engine instance.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DispatchConfig {
    /// Providers in declaration order (the final routing tie-break)
    pub providers: Vec<ProviderConfig>,
    /// Health probe loop settings
    pub health: HealthConfig,
    /// Quota day-bucket settings
    pub quota: QuotaConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_empty() {
        let config = DispatchConfig::default();
        assert!(config.providers.is_empty());
        assert!(config.health.enabled);
    }

    #[test]
    fn serde_json_roundtrip() {
        let mut config = DispatchConfig::default();
        config.providers.push(ProviderConfig::named("claude"));
        let json = serde_json::to_string(&config).unwrap();
        let parsed: DispatchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.providers.len(), 1);
        assert_eq!(parsed.providers[0].name, "claude");
    }

    #[test]
    fn partial_toml_fills_sections() {
        let toml = r#"
            [quota]
            reset_hour_utc = 8
        "#;
        let config: DispatchConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.quota.reset_hour_utc, 8);
        assert_eq!(config.logging.level, "info");
    }
}
