//! sw_fetch tool implementation.
//!
//! Runs one request through the registration, the way a page's fetch would
//! be intercepted. Requests the worker does not take are fetched directly.

use chrono::Utc;
use offcache_client::fetch::resolve;
use offcache_client::{Dispatch, FetchOptions};
use offcache_core::Error;
use offcache_core::model::{Destination, Request, RequestMode};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ServerError;
use crate::state::AppState;

/// Parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// URL to request, absolute or relative to the scope.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Declared resource type: document, style, script, image, font, video, ...
    #[serde(default)]
    pub destination: Destination,

    /// Treat the request as a page navigation.
    #[serde(default)]
    pub navigate: bool,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// `worker` if the intermediary answered, `passthrough` otherwise.
    pub served_by: String,
    pub url: String,
    pub status: u16,
    /// basic, cors or opaque.
    pub response_type: String,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    /// ISO8601 timestamp of when the response was produced.
    pub served_at: String,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(state: &AppState, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let url = resolve(&state.scope, &params.url).map_err(Error::from)?;

    let mut request = Request::get(url).with_method(params.method).with_destination(params.destination);
    if params.navigate {
        request = request.with_mode(RequestMode::Navigate);
    }

    let (served_by, response) = match state.registration.handle(&request).await? {
        Dispatch::Respond(response) => ("worker", response),
        Dispatch::Passthrough => ("passthrough", state.fetcher.fetch(&request, FetchOptions::default()).await?),
    };

    tracing::debug!("{} {} served by {} ({})", request.method, request.url, served_by, response.status);

    let output = SwFetchOutput {
        served_by: served_by.to_string(),
        url: response.url.to_string(),
        status: response.status,
        response_type: response.response_type.to_string(),
        headers: response.headers.clone(),
        body: String::from_utf8_lossy(&response.body).into_owned(),
        served_at: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    };

    let json = serde_json::to_string_pretty(&output).map_err(ServerError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::{SITE, state};
    use crate::tools::install::{SwInstallParams, install_impl};
    use crate::tools::parse_output;

    fn params(url: &str, destination: Destination, navigate: bool) -> SwFetchParams {
        SwFetchParams { url: url.into(), method: default_method(), destination, navigate }
    }

    fn output(result: CallToolResult) -> SwFetchOutput {
        parse_output(&result)
    }

    #[tokio::test]
    async fn test_before_install_passes_through() {
        let state = state(SITE);
        let result = fetch_impl(&state, params("./", Destination::Document, true)).await.unwrap();

        let out = output(result);
        assert_eq!(out.served_by, "passthrough");
        assert_eq!(out.body, "<h1>home</h1>");
    }

    #[tokio::test]
    async fn test_after_install_worker_serves() {
        let state = state(SITE);
        install_impl(&state, SwInstallParams::default()).await.unwrap();

        let out = output(fetch_impl(&state, params("style.css", Destination::Style, false)).await.unwrap());
        assert_eq!(out.served_by, "worker");
        assert_eq!(out.status, 200);
        assert_eq!(out.response_type, "basic");
    }

    #[tokio::test]
    async fn test_video_passes_through_after_install() {
        let state = state(SITE);
        install_impl(&state, SwInstallParams::default()).await.unwrap();

        let out = output(fetch_impl(&state, params("intro.mp4", Destination::Video, false)).await.unwrap());
        assert_eq!(out.served_by, "passthrough");
    }

    #[tokio::test]
    async fn test_font_cdn_is_opaque() {
        let state = state(SITE);
        install_impl(&state, SwInstallParams::default()).await.unwrap();

        let url = "https://fonts.gstatic.com/s/a.woff2";
        let out = output(fetch_impl(&state, params(url, Destination::Font, false)).await.unwrap());
        assert_eq!(out.served_by, "worker");
        assert_eq!(out.response_type, "opaque");
    }

    #[tokio::test]
    async fn test_unsupported_scheme_rejected() {
        let state = state(SITE);
        let result = fetch_impl(&state, params("ftp://example.com/file", Destination::Empty, false)).await;
        assert_eq!(result.unwrap_err().code.0, -32003);
    }

    #[tokio::test]
    async fn test_offline_miss_is_error() {
        let state = state(SITE);
        install_impl(&state, SwInstallParams::default()).await.unwrap();

        let result = fetch_impl(&state, params("missing.png", Destination::Image, false)).await;
        assert_eq!(result.unwrap_err().code.0, -32008);
    }
}
