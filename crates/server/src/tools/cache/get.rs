//! cache_match tool implementation.
//!
//! Looks up a stored response by request identity.

use offcache_client::fetch::resolve;
use offcache_core::{Error, RequestKey, Store};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ServerError;
use crate::state::AppState;

/// Parameters for the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchParams {
    /// URL of the request, absolute or relative to the scope.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Store to search. Defaults to the active generation's runtime store.
    #[serde(default)]
    pub store: Option<String>,
}

/// Output from the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchOutput {
    pub store: String,
    pub key: String,
    pub found: bool,
    pub status: Option<u16>,
    pub response_type: Option<String>,
    pub size: Option<usize>,
}

/// Implementation of the cache_match tool.
pub async fn match_impl(state: &AppState, params: CacheMatchParams) -> Result<CallToolResult, McpError> {
    let url = resolve(&state.scope, &params.url).map_err(Error::from)?;
    let key = RequestKey::new(params.method.as_deref().unwrap_or("GET"), &url);

    let store_name = match params.store {
        Some(name) => name,
        None => match state.registration.active().await {
            Some(worker) => worker.generation().runtime_store().to_string(),
            None => state.config.generation().map_err(ServerError::from)?.runtime_store().to_string(),
        },
    };

    let store = Store::attach(state.storage.clone(), &store_name);
    let entry = store.get(&key).await?;
    tracing::debug!("cache_match {} in {}: {}", key, store_name, entry.is_some());

    let output = CacheMatchOutput {
        store: store_name,
        key: key.to_string(),
        found: entry.is_some(),
        status: entry.as_ref().map(|r| r.status),
        response_type: entry.as_ref().map(|r| r.response_type.to_string()),
        size: entry.as_ref().map(|r| r.body.len()),
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

    fn params(url: &str, store: Option<&str>) -> CacheMatchParams {
        CacheMatchParams { url: url.into(), method: None, store: store.map(String::from) }
    }

    #[tokio::test]
    async fn test_match_missing() {
        let state = state(SITE);
        let output: CacheMatchOutput = parse_output(&match_impl(&state, params("style.css", None)).await.unwrap());
        assert!(!output.found);
        assert_eq!(output.store, "runtime-v1.0.0");
    }

    #[tokio::test]
    async fn test_match_precache_entry() {
        let state = state(SITE);
        install_impl(&state, SwInstallParams::default()).await.unwrap();

        let result = match_impl(&state, params("style.css", Some("precache-v1.0.0"))).await.unwrap();
        let output: CacheMatchOutput = parse_output(&result);
        assert!(output.found);
        assert_eq!(output.status, Some(200));
        assert_eq!(output.response_type.as_deref(), Some("basic"));
        assert_eq!(output.size, Some(6));
        assert_eq!(output.key, "GET https://example.com/style.css");
    }

    #[tokio::test]
    async fn test_match_invalid_url() {
        let state = state(SITE);
        let result = match_impl(&state, params("mailto:someone@example.com", None)).await;
        assert!(result.is_err());
    }
}
