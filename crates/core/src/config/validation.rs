//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::collections::HashSet;

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `version` is empty or contains whitespace
    /// - `scope` is not an absolute http(s) URL ending in `/`
    /// - a precache entry does not resolve, or two entries resolve to the same URL
    /// - a font host pattern is empty
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generation()?;

        let scope = self.scope_url()?;
        if !matches!(scope.scheme(), "http" | "https") {
            return Err(invalid("scope", format!("unsupported scheme: {}", scope.scheme())));
        }
        if !scope.path().ends_with('/') {
            return Err(invalid("scope", "path must end with '/'"));
        }

        let assets = self.precache_assets()?;
        let mut seen = HashSet::new();
        for asset in &assets {
            if !seen.insert(asset.as_str()) {
                return Err(invalid("precache_urls", format!("duplicate entry: {asset}")));
            }
        }

        if self.font_hosts.iter().any(|h| h.trim().is_empty()) {
            return Err(invalid("font_hosts", "patterns must not be empty"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if assets.is_empty() {
            tracing::warn!(version = %self.version, "precache_urls is empty; install will store nothing");
        }

        Ok(())
    }
}
