//! One generation's intermediary: lifecycle hooks plus request handling.

use std::sync::Arc;

use offcache_core::model::Request;
use offcache_core::{CacheStorage, Error, Generation};
use url::Url;

use crate::background::Background;
use crate::classify::Classifier;
use crate::dispatch::{Dispatch, Dispatcher};
use crate::fetch::Fetcher;
use crate::lifecycle::{ActivateReport, GenerationState, InstallReport, Lifecycle};
use crate::strategy::Strategies;

/// The explicit interface a host drives: `on_install`, `on_activate` and
/// `handle`, plus `settle` to wait for deferred store writes.
pub struct ServiceWorker {
    lifecycle: Lifecycle,
    dispatcher: Dispatcher,
    background: Background,
}

impl ServiceWorker {
    pub fn new(
        storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>, generation: Generation, classifier: Classifier,
    ) -> Self {
        let background = Background::new();
        let strategies =
            Strategies::new(Arc::clone(&storage), Arc::clone(&fetcher), generation.clone(), background.clone());

        Self {
            lifecycle: Lifecycle::new(storage, fetcher, generation),
            dispatcher: Dispatcher::new(classifier, strategies),
            background,
        }
    }

    pub fn generation(&self) -> &Generation {
        self.lifecycle.generation()
    }

    pub fn classifier(&self) -> &Classifier {
        self.dispatcher.classifier()
    }

    pub async fn state(&self) -> GenerationState {
        self.lifecycle.state().await
    }

    pub async fn on_install(&self, assets: &[Url]) -> Result<InstallReport, Error> {
        self.lifecycle.on_install(assets).await
    }

    pub async fn on_activate(&self) -> Result<ActivateReport, Error> {
        self.lifecycle.on_activate().await
    }

    pub async fn handle(&self, request: &Request) -> Result<Dispatch, Error> {
        self.dispatcher.dispatch(request).await
    }

    pub(crate) async fn supersede(&self) {
        self.lifecycle.supersede().await;
    }

    /// Wait for every background store write started by `handle`.
    pub async fn settle(&self) {
        self.background.settle().await;
    }
}
