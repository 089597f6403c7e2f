//! Strategy executors.
//!
//! Every executor reads and writes the generation's runtime store only. The
//! precache store is written once at install and never touched here, and no
//! executor creates or deletes a store.
//!
//! Store write failures never fail a request: they are logged and the network
//! response is still returned.

mod cache_first;
mod cross_origin;
mod stale_while_revalidate;

use std::sync::Arc;

use offcache_core::model::{RequestKey, Response};
use offcache_core::{CacheStorage, Generation, Store};

use crate::background::Background;
use crate::fetch::Fetcher;

/// Executors bound to one generation's runtime store.
#[derive(Clone)]
pub struct Strategies {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    generation: Generation,
    background: Background,
}

impl Strategies {
    pub fn new(
        storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>, generation: Generation, background: Background,
    ) -> Self {
        Self { storage, fetcher, generation, background }
    }

    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    fn runtime(&self) -> Store {
        Store::attach(Arc::clone(&self.storage), self.generation.runtime_store())
    }
}

/// Write a snapshot, logging instead of failing.
async fn put_logged(store: &Store, key: &RequestKey, response: &Response) {
    match store.put(key, response).await {
        Ok(()) => tracing::debug!(store = store.name(), %key, status = response.status, "stored response"),
        Err(e) => tracing::warn!(store = store.name(), %key, error = %e, "store write failed"),
    }
}
