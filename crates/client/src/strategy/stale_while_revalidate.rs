use std::sync::Arc;

use offcache_core::model::{Request, Response};
use offcache_core::{Error, Store};

use super::{Strategies, put_logged};
use crate::background::Background;
use crate::fetch::{FetchOptions, Fetcher};

impl Strategies {
    /// Answer from the runtime store when possible and refresh it from the
    /// network either way.
    ///
    /// With a cached entry the fetch and its store write run in the
    /// background and the entry is returned at once, so a dead network still
    /// serves the stale copy. Without one the caller waits for the fetch and
    /// gets its outcome, failure included. Store writes are never awaited.
    pub async fn stale_while_revalidate(&self, request: &Request) -> Result<Response, Error> {
        let store = self.runtime();
        let key = request.key();
        let cached = store.get(&key).await?;

        let revalidate =
            revalidate(Arc::clone(&self.fetcher), self.background.clone(), store, request.clone());

        match cached {
            Some(hit) => {
                tracing::debug!(%key, "stale-while-revalidate hit");
                self.background
                    .spawn(async move {
                        if let Err(e) = revalidate.await {
                            tracing::warn!(%key, error = %e, "revalidation failed, keeping cached copy");
                        }
                    })
                    .await;
                Ok(hit)
            }
            None => {
                tracing::debug!(%key, "stale-while-revalidate miss");
                revalidate.await
            }
        }
    }
}

async fn revalidate(
    fetcher: Arc<dyn Fetcher>, background: Background, store: Store, request: Request,
) -> Result<Response, Error> {
    let response = fetcher.fetch(&request, FetchOptions::default()).await?;
    if response.is_storable_same_origin() {
        let key = request.key();
        let snapshot = response.clone();
        background.spawn(async move { put_logged(&store, &key, &snapshot).await }).await;
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use offcache_core::MemoryStorage;
    use offcache_core::model::Request;

    use crate::testing::{CountingStorage, FakeFetcher, response, strategies, url};

    #[tokio::test]
    async fn test_offline_falls_back_to_cached() {
        let fetcher = Arc::new(FakeFetcher::new().fail(&url("/")));
        let (strategies, store) = strategies(Arc::new(MemoryStorage::new()), fetcher.clone()).await;
        let req = Request::navigate(url("/"));
        store.put(&req.key(), &response("/", 200, "stale home")).await.unwrap();

        let got = strategies.stale_while_revalidate(&req).await.unwrap();
        assert_eq!(&got.body[..], b"stale home");

        strategies.background.settle().await;
        assert_eq!(fetcher.call_count(), 1);
        let kept = store.get(&req.key()).await.unwrap().unwrap();
        assert_eq!(&kept.body[..], b"stale home");
    }

    #[tokio::test]
    async fn test_miss_returns_network_and_fills_store() {
        let fetcher = Arc::new(FakeFetcher::new().respond(&url("/about"), 200, "about"));
        let (strategies, store) = strategies(Arc::new(MemoryStorage::new()), fetcher).await;
        let req = Request::navigate(url("/about"));

        let got = strategies.stale_while_revalidate(&req).await.unwrap();
        assert_eq!(&got.body[..], b"about");

        strategies.background.settle().await;
        let stored = store.get(&req.key()).await.unwrap().unwrap();
        assert_eq!(&stored.body[..], b"about");
    }

    #[tokio::test]
    async fn test_hit_is_refreshed_in_background() {
        let fetcher = Arc::new(FakeFetcher::new().respond(&url("/data.json"), 200, "new"));
        let (strategies, store) = strategies(Arc::new(MemoryStorage::new()), fetcher).await;
        let req = Request::get(url("/data.json"));
        store.put(&req.key(), &response("/data.json", 200, "old")).await.unwrap();

        let got = strategies.stale_while_revalidate(&req).await.unwrap();
        assert_eq!(&got.body[..], b"old");

        strategies.background.settle().await;
        let stored = store.get(&req.key()).await.unwrap().unwrap();
        assert_eq!(&stored.body[..], b"new");
    }

    #[tokio::test]
    async fn test_miss_and_offline_fails() {
        let fetcher = Arc::new(FakeFetcher::new());
        let (strategies, _) = strategies(Arc::new(MemoryStorage::new()), fetcher).await;

        let result = strategies.stale_while_revalidate(&Request::navigate(url("/offline"))).await;
        assert!(result.unwrap_err().is_network());
    }

    #[tokio::test]
    async fn test_error_status_returned_not_stored() {
        let fetcher = Arc::new(FakeFetcher::new().respond(&url("/broken"), 500, "oops"));
        let (strategies, store) = strategies(Arc::new(MemoryStorage::new()), fetcher).await;
        let req = Request::navigate(url("/broken"));

        let got = strategies.stale_while_revalidate(&req).await.unwrap();
        assert_eq!(got.status, 500);

        strategies.background.settle().await;
        assert!(store.get(&req.key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_write_failure_is_not_fatal() {
        let storage = Arc::new(CountingStorage::with_quota(0));
        let fetcher = Arc::new(FakeFetcher::new().respond(&url("/"), 200, "home"));
        let (strategies, _) = strategies(storage.clone(), fetcher).await;

        let got = strategies.stale_while_revalidate(&Request::navigate(url("/"))).await.unwrap();
        assert_eq!(&got.body[..], b"home");

        strategies.background.settle().await;
        assert_eq!(storage.puts(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_revalidations_last_write_wins() {
        let fetcher = Arc::new(FakeFetcher::new().counter(&url("/feed"), "feed").with_delay(Duration::from_millis(5)));
        let (strategies, store) = strategies(Arc::new(MemoryStorage::new()), fetcher.clone()).await;
        let req = Request::get(url("/feed"));

        let (a, b, c) = tokio::join!(
            strategies.stale_while_revalidate(&req),
            strategies.stale_while_revalidate(&req),
            strategies.cache_first(&req),
        );
        let bodies = [a.unwrap().body, b.unwrap().body, c.unwrap().body];
        assert!(bodies.iter().all(|body| body.starts_with(b"feed-")));

        strategies.background.settle().await;
        assert_eq!(fetcher.call_count(), 3);
        assert_eq!(store.keys().await.unwrap().len(), 1);
        let stored = store.get(&req.key()).await.unwrap().unwrap();
        assert!(bodies.contains(&stored.body));
    }
}
