//! Cache Store Abstraction.
//!
//! The host's persistent named key-value store, reduced to the operations the
//! intermediary needs. Backends implement [`CacheStorage`]; callers work with
//! a [`Store`] handle from [`Store::open`] (creates the store) or
//! [`Store::attach`] (does not).

use std::fmt;
use std::sync::Arc;

use crate::Error;
use crate::model::{RequestKey, Response};

/// Named stores of request → response snapshots.
///
/// Store creation and deletion belong to the lifecycle; strategies only read
/// and write entries through a [`Store`] handle.
#[async_trait::async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the named store if it does not exist yet.
    async fn open_store(&self, name: &str) -> Result<(), Error>;

    /// Delete a store and all of its entries. Returns false if it did not exist.
    async fn delete_store(&self, name: &str) -> Result<bool, Error>;

    /// Names of all existing stores, in creation order.
    async fn store_names(&self) -> Result<Vec<String>, Error>;

    /// Look up an entry. A missing store reads as empty.
    async fn get_entry(&self, store: &str, key: &RequestKey) -> Result<Option<Response>, Error>;

    /// Insert or overwrite an entry.
    ///
    /// Fails with `Error::StoreMissing` if the store was never opened or has
    /// been deleted; writes never resurrect a store.
    async fn put_entry(&self, store: &str, key: &RequestKey, response: &Response) -> Result<(), Error>;

    /// Keys of every entry in a store.
    async fn entry_keys(&self, store: &str) -> Result<Vec<RequestKey>, Error>;
}

/// Handle to one opened store.
#[derive(Clone)]
pub struct Store {
    storage: Arc<dyn CacheStorage>,
    name: String,
}

impl Store {
    /// Open (creating if needed) the named store.
    pub async fn open(storage: Arc<dyn CacheStorage>, name: &str) -> Result<Self, Error> {
        storage.open_store(name).await?;
        Ok(Self { storage, name: name.to_string() })
    }

    /// Handle to a store without creating it.
    ///
    /// If the store does not exist, reads come back empty and writes fail with
    /// `Error::StoreMissing`.
    pub fn attach(storage: Arc<dyn CacheStorage>, name: &str) -> Self {
        Self { storage, name: name.to_string() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn get(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        self.storage.get_entry(&self.name, key).await
    }

    /// Store a response snapshot under `key`, overwriting any previous entry.
    ///
    /// Only `GET` requests can be stored.
    pub async fn put(&self, key: &RequestKey, response: &Response) -> Result<(), Error> {
        if key.method != "GET" {
            return Err(Error::UnsupportedMethod(key.method.clone()));
        }
        self.storage.put_entry(&self.name, key, response).await
    }

    pub async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        self.storage.entry_keys(&self.name).await
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store").field("name", &self.name).finish_non_exhaustive()
    }
}
