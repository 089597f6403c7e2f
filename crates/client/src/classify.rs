//! Request classification.
//!
//! Pure and total: every request maps to exactly one [`Classification`], and
//! each classification to exactly one [`Strategy`].
//!
//! Decision order:
//! 1. Cross-origin: font CDN host → `CrossOriginFont`, anything else → `External`
//! 2. Navigation → `NavigationDocument`
//! 3. Declared destination: style/script/image/font, video, everything else → `Other`

use offcache_core::model::{Destination, Request};
use serde::Serialize;
use url::Origin;

/// Per-request classification tag. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    NavigationDocument,
    Style,
    Script,
    Image,
    Font,
    Video,
    CrossOriginFont,
    /// Cross-origin and not a known font host; left to the host untouched.
    External,
    Other,
}

/// How a classified request is resolved between store and network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    CacheFirst,
    StaleWhileRevalidate,
    OpportunisticCrossOrigin,
    /// No response override; default host handling.
    Passthrough,
}

impl Classification {
    pub fn strategy(self) -> Strategy {
        match self {
            Classification::Style | Classification::Script | Classification::Image | Classification::Font => {
                Strategy::CacheFirst
            }
            Classification::NavigationDocument | Classification::Other => Strategy::StaleWhileRevalidate,
            Classification::CrossOriginFont => Strategy::OpportunisticCrossOrigin,
            Classification::Video | Classification::External => Strategy::Passthrough,
        }
    }
}

/// Maps requests to classifications for one serving origin.
#[derive(Debug, Clone)]
pub struct Classifier {
    origin: Origin,
    font_hosts: Vec<String>,
}

impl Classifier {
    /// `font_hosts` are hostname substrings, matched case-insensitively.
    pub fn new(origin: Origin, font_hosts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let font_hosts = font_hosts
            .into_iter()
            .map(|h| h.into().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        Self { origin, font_hosts }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    fn is_font_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.font_hosts.iter().any(|pattern| host.contains(pattern.as_str()))
    }

    pub fn classify(&self, request: &Request) -> Classification {
        if request.url.origin() != self.origin {
            return match request.url.host_str() {
                Some(host) if self.is_font_host(host) => Classification::CrossOriginFont,
                _ => Classification::External,
            };
        }

        if request.is_navigation() {
            return Classification::NavigationDocument;
        }

        match request.destination {
            Destination::Style => Classification::Style,
            Destination::Script => Classification::Script,
            Destination::Image => Classification::Image,
            Destination::Font => Classification::Font,
            Destination::Video => Classification::Video,
            _ => Classification::Other,
        }
    }
}
