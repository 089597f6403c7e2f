//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (OFFCACHE_*)
//! 2. TOML config file (if OFFCACHE_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The version token and precache list are injected here; changing `version`
//! is the only way to start a new generation.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Generation;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache storage database.
    ///
    /// Set via OFFCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Registration scope. Its origin is the serving origin and relative
    /// precache URLs resolve against it.
    ///
    /// Set via OFFCACHE_SCOPE environment variable.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Generation version token.
    ///
    /// Set via OFFCACHE_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// Ordered list of assets fetched and stored at install.
    #[serde(default = "default_precache_urls")]
    pub precache_urls: Vec<String>,

    /// Hostname substrings identifying the cross-origin font CDN.
    #[serde(default = "default_font_hosts")]
    pub font_hosts: Vec<String>,

    /// User-Agent string for network fetches.
    ///
    /// Set via OFFCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum response body bytes accepted from the network.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Network timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum redirects followed per fetch.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./offcache.sqlite")
}

fn default_scope() -> String {
    "http://localhost:8080/".into()
}

fn default_version() -> String {
    "v1.0.0".into()
}

fn default_precache_urls() -> Vec<String> {
    vec!["./".into()]
}

fn default_font_hosts() -> Vec<String> {
    vec!["fonts.gstatic.com".into(), "fonts.googleapis.com".into()]
}

fn default_user_agent() -> String {
    "offcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_redirects() -> usize {
    5
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            scope: default_scope(),
            version: default_version(),
            precache_urls: default_precache_urls(),
            font_hosts: default_font_hosts(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be read or parsed, or if
    /// validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("OFFCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("OFFCACHE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        Self::from_figment(&figment)
    }

    /// Extract and validate from an already-assembled figment.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Parsed registration scope.
    pub fn scope_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.scope)
            .map_err(|e| ConfigError::Invalid { field: "scope".into(), reason: e.to_string() })
    }

    /// Generation descriptor for the configured version token.
    pub fn generation(&self) -> Result<Generation, ConfigError> {
        Generation::new(self.version.clone())
            .map_err(|e| ConfigError::Invalid { field: "version".into(), reason: e.to_string() })
    }

    /// Precache list resolved against the scope, in configured order.
    pub fn precache_assets(&self) -> Result<Vec<Url>, ConfigError> {
        let scope = self.scope_url()?;
        self.precache_urls
            .iter()
            .map(|entry| {
                scope.join(entry).map_err(|e| ConfigError::Invalid {
                    field: "precache_urls".into(),
                    reason: format!("{entry:?}: {e}"),
                })
            })
            .collect()
    }
}
