//! Configuration for health probing.

use serde::{Deserialize, Serialize};

/// Configuration for the provider health probe loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Whether the probe loop runs at all
    pub enabled: bool,
    /// Seconds between probe cycles
    pub interval_seconds: u64,
    /// Timeout for each individual probe
    pub probe_timeout_seconds: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 300,
            probe_timeout_seconds: 5,
        }
    }
}
