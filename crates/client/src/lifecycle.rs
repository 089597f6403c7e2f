//! Generation lifecycle: install, activate, superseded.
//!
//! ### Install
//! - Opens the generation's precache and runtime stores.
//! - Fetches every asset concurrently. Any transport failure or non-2xx status
//!   fails the whole install and nothing is written.
//! - Writes each response into the precache store under the asset URL.
//!   Entries are overwritten by key, so installing twice is the same as once.
//!
//! ### Activate
//! - Allowed only after a successful install.
//! - Deletes every store the generation does not own.

use std::fmt;
use std::sync::Arc;

use offcache_core::model::{Request, RequestKey, Response};
use offcache_core::{CacheStorage, Error, Generation, Store};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use url::Url;

use crate::fetch::{FetchOptions, Fetcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationState {
    Installing,
    /// Installed and waiting for the activate signal.
    Installed,
    Active,
    /// A newer generation became active.
    Superseded,
    /// The last install attempt failed. Install may be retried.
    Failed,
}

impl GenerationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationState::Installing => "installing",
            GenerationState::Installed => "installed",
            GenerationState::Active => "active",
            GenerationState::Superseded => "superseded",
            GenerationState::Failed => "failed",
        }
    }
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub version: String,
    pub store: String,
    pub cached: usize,
    /// Ask the host to activate without waiting for old clients to close.
    pub skip_waiting: bool,
}

/// Result of a successful activate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivateReport {
    pub version: String,
    pub deleted: Vec<String>,
    /// Ask the host to route already open clients to this generation.
    pub claim_clients: bool,
}

/// Owns store creation and deletion for one generation.
pub struct Lifecycle {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    generation: Generation,
    state: RwLock<GenerationState>,
}

impl Lifecycle {
    pub fn new(storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>, generation: Generation) -> Self {
        Self { storage, fetcher, generation, state: RwLock::new(GenerationState::Installing) }
    }

    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    pub async fn state(&self) -> GenerationState {
        *self.state.read().await
    }

    /// Populate the precache store from `assets`.
    ///
    /// # Errors
    ///
    /// `Error::InstallFailed` naming the first asset that could not be
    /// fetched or stored, or `Error::InvalidState` once the generation has been
    /// activated.
    pub async fn on_install(&self, assets: &[Url]) -> Result<InstallReport, Error> {
        {
            let mut state = self.state.write().await;
            if matches!(*state, GenerationState::Active | GenerationState::Superseded) {
                return Err(Error::InvalidState { action: "install", state: state.to_string() });
            }
            *state = GenerationState::Installing;
        }

        tracing::info!(version = self.generation.version(), assets = assets.len(), "installing generation");

        match self.populate(assets).await {
            Ok(report) => {
                *self.state.write().await = GenerationState::Installed;
                tracing::info!(version = self.generation.version(), cached = report.cached, "generation installed");
                Ok(report)
            }
            Err(e) => {
                *self.state.write().await = GenerationState::Failed;
                tracing::warn!(version = self.generation.version(), error = %e, "install failed");
                Err(e)
            }
        }
    }

    async fn populate(&self, assets: &[Url]) -> Result<InstallReport, Error> {
        let precache = Store::open(Arc::clone(&self.storage), self.generation.precache_store()).await?;
        Store::open(Arc::clone(&self.storage), self.generation.runtime_store()).await?;

        let responses = fetch_all(&self.fetcher, assets).await?;

        for (url, response) in assets.iter().zip(&responses) {
            precache
                .put(&RequestKey::new("GET", url), response)
                .await
                .map_err(|e| Error::InstallFailed { url: url.to_string(), reason: e.to_string() })?;
        }

        Ok(InstallReport {
            version: self.generation.version().to_string(),
            store: precache.name().to_string(),
            cached: responses.len(),
            skip_waiting: true,
        })
    }

    /// Delete every store this generation does not own.
    ///
    /// # Errors
    ///
    /// `Error::InvalidState` unless the generation is installed and waiting.
    pub async fn on_activate(&self) -> Result<ActivateReport, Error> {
        let mut state = self.state.write().await;
        if *state != GenerationState::Installed {
            return Err(Error::InvalidState { action: "activate", state: state.to_string() });
        }

        let mut deleted = Vec::new();
        for name in self.storage.store_names().await? {
            if self.generation.owns(&name) {
                continue;
            }
            if self.storage.delete_store(&name).await? {
                deleted.push(name);
            }
        }

        *state = GenerationState::Active;
        tracing::info!(version = self.generation.version(), deleted = ?deleted, "generation active");

        Ok(ActivateReport { version: self.generation.version().to_string(), deleted, claim_clients: true })
    }

    /// Mark the generation as replaced by a newer active one.
    pub async fn supersede(&self) {
        let mut state = self.state.write().await;
        if *state != GenerationState::Superseded {
            *state = GenerationState::Superseded;
            tracing::info!(version = self.generation.version(), "generation superseded");
        }
    }
}

/// Fetch every asset concurrently, returning responses in asset order.
async fn fetch_all(fetcher: &Arc<dyn Fetcher>, assets: &[Url]) -> Result<Vec<Response>, Error> {
    let mut tasks = JoinSet::new();
    for (index, url) in assets.iter().enumerate() {
        let fetcher = Arc::clone(fetcher);
        let url = url.clone();
        tasks.spawn(async move {
            let result = fetcher.fetch(&Request::get(url.clone()), FetchOptions::default()).await;
            (index, url, result)
        });
    }

    let mut responses: Vec<Option<Response>> = vec![None; assets.len()];
    while let Some(joined) = tasks.join_next().await {
        let (index, url, result) = joined
            .map_err(|e| Error::InstallFailed { url: String::new(), reason: format!("fetch task failed: {e}") })?;
        let response = match result {
            Ok(response) if response.ok() => response,
            Ok(response) => {
                return Err(Error::InstallFailed { url: url.to_string(), reason: format!("status {}", response.status) });
            }
            Err(e) => return Err(Error::InstallFailed { url: url.to_string(), reason: e.to_string() }),
        };
        responses[index] = Some(response);
    }

    Ok(responses.into_iter().flatten().collect())
}
