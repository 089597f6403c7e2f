//! Shared state behind every tool call.

use std::sync::Arc;

use offcache_client::{Classifier, Fetcher, Registration, ServiceWorker};
use offcache_core::{AppConfig, CacheStorage, Generation};
use url::Url;

use crate::error::ServerError;

pub struct AppState {
    pub config: AppConfig,
    pub scope: Url,
    pub storage: Arc<dyn CacheStorage>,
    pub fetcher: Arc<dyn Fetcher>,
    pub registration: Registration,
}

impl AppState {
    pub fn new(config: AppConfig, storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>) -> Result<Self, ServerError> {
        let scope = config.scope_url()?;
        let registration = Registration::new(scope.clone());
        Ok(Self { config, scope, storage, fetcher, registration })
    }

    /// A fresh worker for `generation`, serving the configured scope.
    pub fn worker(&self, generation: Generation) -> ServiceWorker {
        let classifier = Classifier::new(self.scope.origin(), self.config.font_hosts.iter().cloned());
        ServiceWorker::new(Arc::clone(&self.storage), Arc::clone(&self.fetcher), generation, classifier)
    }
}
