//! Network fetch capability.
//!
//! ### Fetch contract
//! - Any HTTP status is a response; only transport failures are errors.
//! - `CacheMode::NoStore` asks intermediate HTTP caches to stay out of the way.
//! - `RequestMode::NoCors` tolerates cross-origin responses and marks them opaque.
//!
//! ### Response typing
//! - Final URL on the serving origin: `basic`
//! - Cross-origin in no-cors mode: `opaque`
//! - Any other cross-origin response: `cors`

pub mod url;

use offcache_core::model::{CacheMode, Request, RequestMode, Response, ResponseType};
use offcache_core::{AppConfig, Error};
use reqwest::{Client, Method, header};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, resolve};

/// Per-fetch options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    pub cache: CacheMode,
    /// Overrides the request's own mode when set.
    pub mode: Option<RequestMode>,
}

impl FetchOptions {
    /// Bypass intermediate HTTP caches.
    pub fn no_store() -> Self {
        Self { cache: CacheMode::NoStore, mode: None }
    }

    /// Accept opaque cross-origin responses.
    pub fn no_cors() -> Self {
        Self { cache: CacheMode::Default, mode: Some(RequestMode::NoCors) }
    }
}

/// Network fetch provided by the host.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a request. Resolves to a response for every HTTP status and
    /// fails only when no response could be obtained.
    async fn fetch(&self, request: &Request, options: FetchOptions) -> Result<Response, Error>;
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "offcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "offcache/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
        }
    }
}

/// Classify a response by where it ended up relative to the serving origin.
pub fn response_type_for(origin: &::url::Origin, final_url: &::url::Url, mode: RequestMode) -> ResponseType {
    if final_url.origin() == *origin {
        ResponseType::Basic
    } else if mode == RequestMode::NoCors {
        ResponseType::Opaque
    } else {
        ResponseType::Cors
    }
}

/// [`Fetcher`] backed by reqwest.
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
    origin: ::url::Origin,
}

impl HttpFetcher {
    /// Create a fetcher for a worker serving `origin`.
    pub fn new(config: FetchConfig, origin: ::url::Origin) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::FetchFailed(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config, origin })
    }
}

fn map_reqwest_error(url: &::url::Url, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(format!("{url}: {err}"))
    } else {
        Error::FetchFailed(format!("{url}: {err}"))
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request, options: FetchOptions) -> Result<Response, Error> {
        let start = Instant::now();
        let mode = options.mode.unwrap_or(request.mode);

        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| Error::InvalidInput(format!("invalid method: {}", request.method)))?;

        let mut builder = self.http.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if options.cache == CacheMode::NoStore {
            builder = builder
                .header(header::CACHE_CONTROL, "no-store")
                .header(header::PRAGMA, "no-cache");
        }

        let response = builder.send().await.map_err(|e| map_reqwest_error(&request.url, e))?;

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();

        let body = response.bytes().await.map_err(|e| map_reqwest_error(&request.url, e))?;

        if body.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", body.len(), self.config.max_bytes)));
        }

        let response_type = response_type_for(&self.origin, &final_url, mode);

        tracing::debug!(
            "fetched {} {} -> {} {} ({}) in {}ms ({} bytes)",
            request.method,
            request.url,
            final_url,
            status,
            response_type,
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(Response { url: final_url, status, response_type, headers, body })
    }
}
