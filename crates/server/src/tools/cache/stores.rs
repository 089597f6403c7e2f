//! cache_stores tool implementation.
//!
//! Lists every store with its entry count and the active generation.

use offcache_core::CacheStorage;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ServerError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreSummary {
    pub name: String,
    pub entries: usize,
}

/// Output from the cache_stores tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStoresOutput {
    /// Stores in creation order.
    pub stores: Vec<StoreSummary>,
    /// Version of the active generation, if one has been activated.
    pub active_version: Option<String>,
    /// Lifecycle state of the active worker.
    pub active_state: Option<String>,
}

/// Implementation of the cache_stores tool.
pub async fn stores_impl(state: &AppState) -> Result<CallToolResult, McpError> {
    let mut stores = Vec::new();
    for name in state.storage.store_names().await? {
        let entries = state.storage.entry_keys(&name).await?.len();
        stores.push(StoreSummary { name, entries });
    }

    let (active_version, active_state) = match state.registration.active().await {
        Some(worker) => (Some(worker.generation().version().to_string()), Some(worker.state().await.to_string())),
        None => (None, None),
    };

    let output = CacheStoresOutput { stores, active_version, active_state };
    let json = serde_json::to_string_pretty(&output).map_err(ServerError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
