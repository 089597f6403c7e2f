//! Request descriptors as seen by the interception hook.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::hash::compute_cache_key;

/// Declared resource type of a request (the fetch `destination`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// No declared type (fetch(), XHR, beacons).
    #[default]
    Empty,
    Document,
    Style,
    Script,
    Image,
    Font,
    Video,
    Audio,
    /// Anything else the host reports.
    #[serde(other)]
    Other,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Empty => "empty",
            Destination::Document => "document",
            Destination::Style => "style",
            Destination::Script => "script",
            Destination::Image => "image",
            Destination::Font => "font",
            Destination::Video => "video",
            Destination::Audio => "audio",
            Destination::Other => "other",
        }
    }
}

impl FromStr for Destination {
    type Err = std::convert::Infallible;

    /// Unknown names map to [`Destination::Other`]; parsing never fails.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "" | "empty" => Destination::Empty,
            "document" => Destination::Document,
            "style" => Destination::Style,
            "script" => Destination::Script,
            "image" => Destination::Image,
            "font" => Destination::Font,
            "video" => Destination::Video,
            "audio" => Destination::Audio,
            _ => Destination::Other,
        })
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request mode. `Navigate` marks a page navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    Navigate,
    SameOrigin,
    NoCors,
    #[default]
    Cors,
}

/// HTTP cache directive for an outgoing fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheMode {
    #[default]
    Default,
    /// Bypass any intermediate HTTP cache.
    NoStore,
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub destination: Destination,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// A plain GET with no declared destination.
    pub fn get(url: Url) -> Self {
        Self { method: "GET".into(), url, destination: Destination::Empty, mode: RequestMode::Cors, headers: Vec::new() }
    }

    /// A top-level page navigation.
    pub fn navigate(url: Url) -> Self {
        Self { destination: Destination::Document, mode: RequestMode::Navigate, ..Self::get(url) }
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into().to_ascii_uppercase();
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Store key for this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }
}

/// Normalized request identity used as the store key.
///
/// Method is uppercased and the URL fragment dropped, so `/a#top` and `/a`
/// share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: &str, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self { method: method.to_ascii_uppercase(), url: url.to_string() }
    }

    /// Content-addressed hash of the key, stable across processes.
    pub fn hash(&self) -> String {
        compute_cache_key(&self.method, &self.url)
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
