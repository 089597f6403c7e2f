//! Test doubles: a scripted fetcher and a store that counts its calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use offcache_core::model::{RequestKey, RequestMode, Response};
use offcache_core::{CacheStorage, Error, Generation, MemoryStorage, Request, Store};
use url::Url;

use crate::background::Background;
use crate::fetch::{FetchOptions, Fetcher, response_type_for};
use crate::strategy::Strategies;

pub const ORIGIN: &str = "https://example.com";

pub fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

pub fn response(path: &str, status: u16, body: &str) -> Response {
    let url = url(path);
    let response_type = response_type_for(&Url::parse(ORIGIN).unwrap().origin(), &url, RequestMode::Cors);
    Response::new(url, status, response_type, body.to_string())
}

/// Executors for generation `v1` with its runtime store already opened.
pub async fn strategies(storage: Arc<dyn CacheStorage>, fetcher: Arc<FakeFetcher>) -> (Strategies, Store) {
    let generation = Generation::new("v1").unwrap();
    let store = Store::open(storage.clone(), generation.runtime_store()).await.unwrap();
    (Strategies::new(storage, fetcher, generation, Background::new()), store)
}

#[derive(Clone)]
enum Route {
    Respond { status: u16, body: String },
    /// Body is `{prefix}-{n}` where n counts calls to this route.
    Counter { prefix: String, hits: usize },
    Fail,
}

/// Fetcher answering from a route table; unknown URLs fail like a dead network.
#[derive(Default)]
pub struct FakeFetcher {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<(String, FetchOptions)>>,
    delay: Option<Duration>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond(self, url: &Url, status: u16, body: &str) -> Self {
        self.set(url, Route::Respond { status, body: body.to_string() });
        self
    }

    pub fn counter(self, url: &Url, prefix: &str) -> Self {
        self.set(url, Route::Counter { prefix: prefix.to_string(), hits: 0 });
        self
    }

    pub fn fail(self, url: &Url) -> Self {
        self.set(url, Route::Fail);
        self
    }

    /// Replace the route for `url` after construction.
    pub fn set_fail(&self, url: &Url) {
        self.set(url, Route::Fail);
    }

    pub fn set_respond(&self, url: &Url, status: u16, body: &str) {
        self.set(url, Route::Respond { status, body: body.to_string() });
    }

    fn set(&self, url: &Url, route: Route) {
        self.routes.lock().unwrap().insert(url.to_string(), route);
    }

    pub fn calls(&self) -> Vec<(String, FetchOptions)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, request: &Request, options: FetchOptions) -> Result<Response, Error> {
        let key = request.url.to_string();
        self.calls.lock().unwrap().push((key.clone(), options));

        let (status, body) = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(&key) {
                Some(Route::Respond { status, body }) => (*status, body.clone()),
                Some(Route::Counter { prefix, hits }) => {
                    *hits += 1;
                    (200, format!("{prefix}-{hits}"))
                }
                Some(Route::Fail) | None => (0, String::new()),
            }
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if status == 0 {
            return Err(Error::FetchFailed(format!("{key}: connection refused")));
        }

        let mode = options.mode.unwrap_or(request.mode);
        let response_type = response_type_for(&Url::parse(ORIGIN).unwrap().origin(), &request.url, mode);
        Ok(Response::new(request.url.clone(), status, response_type, body))
    }
}

/// [`MemoryStorage`] wrapper counting entry reads and writes.
#[derive(Default)]
pub struct CountingStorage {
    inner: MemoryStorage,
    gets: AtomicUsize,
    puts: AtomicUsize,
}

impl CountingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(bytes: usize) -> Self {
        Self { inner: MemoryStorage::with_quota(bytes), ..Default::default() }
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CacheStorage for CountingStorage {
    async fn open_store(&self, name: &str) -> Result<(), Error> {
        self.inner.open_store(name).await
    }

    async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        self.inner.delete_store(name).await
    }

    async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.inner.store_names().await
    }

    async fn get_entry(&self, store: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get_entry(store, key).await
    }

    async fn put_entry(&self, store: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put_entry(store, key, response).await
    }

    async fn entry_keys(&self, store: &str) -> Result<Vec<RequestKey>, Error> {
        self.inner.entry_keys(store).await
    }
}
