//! In-memory [`CacheStorage`] backend.
//!
//! Nothing survives the process. Used for ephemeral hosts and as the fake
//! store in tests. An optional quota bounds the total body bytes held across
//! all stores.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::storage::CacheStorage;
use crate::Error;
use crate::model::{RequestKey, Response};

type Entries = HashMap<String, (RequestKey, Response)>;

/// In-memory store map. Stores keep their creation order.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    stores: RwLock<Vec<(String, Entries)>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes that would push total body bytes above `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self { stores: RwLock::default(), quota: Some(bytes) }
    }
}

fn used_bytes(stores: &[(String, Entries)]) -> usize {
    stores
        .iter()
        .flat_map(|(_, entries)| entries.values())
        .map(|(_, response)| response.body.len())
        .sum()
}

#[async_trait::async_trait]
impl CacheStorage for MemoryStorage {
    async fn open_store(&self, name: &str) -> Result<(), Error> {
        let mut stores = self.stores.write().await;
        if !stores.iter().any(|(n, _)| n == name) {
            stores.push((name.to_string(), HashMap::new()));
        }
        Ok(())
    }

    async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let mut stores = self.stores.write().await;
        let before = stores.len();
        stores.retain(|(n, _)| n != name);
        Ok(stores.len() != before)
    }

    async fn store_names(&self) -> Result<Vec<String>, Error> {
        let stores = self.stores.read().await;
        Ok(stores.iter().map(|(n, _)| n.clone()).collect())
    }

    async fn get_entry(&self, store: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        let stores = self.stores.read().await;
        Ok(stores
            .iter()
            .find(|(n, _)| n == store)
            .and_then(|(_, entries)| entries.get(&key.hash()))
            .map(|(_, response)| response.clone()))
    }

    async fn put_entry(&self, store: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
        let mut stores = self.stores.write().await;

        if let Some(quota) = self.quota {
            let hash = key.hash();
            let replaced = stores
                .iter()
                .find(|(n, _)| n == store)
                .and_then(|(_, entries)| entries.get(&hash))
                .map_or(0, |(_, old)| old.body.len());
            let after = used_bytes(&stores) - replaced + response.body.len();
            if after > quota {
                return Err(Error::QuotaExceeded(format!("{after} bytes exceeds {quota}")));
            }
        }

        let (_, entries) = stores
            .iter_mut()
            .find(|(n, _)| n == store)
            .ok_or_else(|| Error::StoreMissing(store.to_string()))?;
        entries.insert(key.hash(), (key.clone(), response.clone()));
        Ok(())
    }

    async fn entry_keys(&self, store: &str) -> Result<Vec<RequestKey>, Error> {
        let stores = self.stores.read().await;
        let mut keys: Vec<RequestKey> = stores
            .iter()
            .find(|(n, _)| n == store)
            .map(|(_, entries)| entries.values().map(|(k, _)| k.clone()).collect())
            .unwrap_or_default();
        keys.sort_by(|a, b| a.url.cmp(&b.url).then_with(|| a.method.cmp(&b.method)));
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResponseType;
    use url::Url;

    fn entry(path: &str, body: &'static str) -> (RequestKey, Response) {
        let url = Url::parse("https://example.com").unwrap().join(path).unwrap();
        (RequestKey::new("GET", &url), Response::new(url, 200, ResponseType::Basic, body))
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let storage = MemoryStorage::new();
        storage.open_store("runtime-v1").await.unwrap();
        let (key, response) = entry("/style.css", "body{}");

        storage.put_entry("runtime-v1", &key, &response).await.unwrap();

        let got = storage.get_entry("runtime-v1", &key).await.unwrap().unwrap();
        assert_eq!(got.body, response.body);
    }

    #[tokio::test]
    async fn test_put_missing_store() {
        let storage = MemoryStorage::new();
        let (key, response) = entry("/", "home");
        let result = storage.put_entry("runtime-v0", &key, &response).await;
        assert!(matches!(result, Err(Error::StoreMissing(_))));
        assert!(storage.store_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_store_drops_entries() {
        let storage = MemoryStorage::new();
        storage.open_store("runtime-v1").await.unwrap();
        let (key, response) = entry("/", "home");
        storage.put_entry("runtime-v1", &key, &response).await.unwrap();

        assert!(storage.delete_store("runtime-v1").await.unwrap());
        assert!(!storage.delete_store("runtime-v1").await.unwrap());

        storage.open_store("runtime-v1").await.unwrap();
        assert!(storage.get_entry("runtime-v1", &key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_names_creation_order() {
        let storage = MemoryStorage::new();
        storage.open_store("runtime-v2").await.unwrap();
        storage.open_store("precache-v2").await.unwrap();
        storage.open_store("runtime-v2").await.unwrap();
        assert_eq!(storage.store_names().await.unwrap(), vec!["runtime-v2", "precache-v2"]);
    }

    #[tokio::test]
    async fn test_quota_rejects_oversized_write() {
        let storage = MemoryStorage::with_quota(6);
        storage.open_store("runtime-v1").await.unwrap();
        let (home, small) = entry("/", "home");
        let (logo, big) = entry("/logo.svg", "<svg/>");

        storage.put_entry("runtime-v1", &home, &small).await.unwrap();
        let result = storage.put_entry("runtime-v1", &logo, &big).await;
        assert!(matches!(result, Err(Error::QuotaExceeded(_))));
        assert!(storage.get_entry("runtime-v1", &logo).await.unwrap().is_none());

        let (_, replacement) = entry("/", "h2");
        storage.put_entry("runtime-v1", &home, &replacement).await.unwrap();
    }

    #[tokio::test]
    async fn test_overwrite_keeps_single_key() {
        let storage = MemoryStorage::new();
        storage.open_store("runtime-v1").await.unwrap();
        let (key, first) = entry("/", "old");
        let (_, second) = entry("/", "new");
        storage.put_entry("runtime-v1", &key, &first).await.unwrap();
        storage.put_entry("runtime-v1", &key, &second).await.unwrap();

        assert_eq!(storage.entry_keys("runtime-v1").await.unwrap().len(), 1);
        let got = storage.get_entry("runtime-v1", &key).await.unwrap().unwrap();
        assert_eq!(&got.body[..], b"new");
    }
}
