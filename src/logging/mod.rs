//! Structured logging setup for embedders.
//!
//! The core logs through `tracing` and never installs a subscriber on its
//! own; embedders call [`init`] (or install their own subscriber) once at
//! startup.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Build filter directives string from a [`LoggingConfig`].
///
/// Produces the base level plus any component-specific levels, e.g.
/// `"info,relay::routing=debug"`.
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        for (component, level) in component_levels {
            filter_str.push_str(&format!(",relay::{}={}", component, level));
        }
    }

    filter_str
}

/// Install a global tracing subscriber for the given configuration.
///
/// Idempotent: if a subscriber is already installed this is a no-op, so
/// tests and embedders that configure logging themselves are unaffected.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_new(build_filter_directives(config))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match config.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed, leaving it in place");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn base_level_only() {
        let config = LoggingConfig::default();
        assert_eq!(build_filter_directives(&config), "info");
    }

    #[test]
    fn component_levels_are_appended() {
        let mut component_levels = HashMap::new();
        component_levels.insert("routing".to_string(), "debug".to_string());

        let config = LoggingConfig {
            level: "warn".to_string(),
            component_levels: Some(component_levels),
            ..LoggingConfig::default()
        };

        assert_eq!(build_filter_directives(&config), "warn,relay::routing=debug");
    }

    #[test]
    fn init_is_idempotent() {
        let config = LoggingConfig::default();
        init(&config);
        init(&config);
    }
}
