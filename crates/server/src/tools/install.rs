//! sw_install tool implementation.
//!
//! Installs a generation from the configured asset list and activates it.

use offcache_client::Installation;
use offcache_core::Generation;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ServerError;
use crate::state::AppState;

/// Parameters for the sw_install tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwInstallParams {
    /// Version token to install. Defaults to the configured version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Implementation of the sw_install tool.
pub async fn install_impl(state: &AppState, params: SwInstallParams) -> Result<CallToolResult, McpError> {
    let generation = match params.version {
        Some(version) => Generation::new(version)?,
        None => state.config.generation().map_err(ServerError::from)?,
    };
    let assets = state.config.precache_assets().map_err(ServerError::from)?;

    let worker = state.worker(generation);
    let installation: Installation = state.registration.install(worker, &assets).await?;

    let json = serde_json::to_string_pretty(&installation).map_err(ServerError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
