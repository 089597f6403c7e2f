//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::state::AppState;
use crate::tools::cache::{CacheMatchParams, match_impl, stores_impl};
use crate::tools::fetch::{SwFetchParams, fetch_impl};
use crate::tools::install::{SwInstallParams, install_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for offcache.
#[derive(Clone)]
pub struct OffcacheServer {
    tool_router: ToolRouter<Self>,
    state: Arc<AppState>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl OffcacheServer {
    /// Create a new server handler.
    pub fn new(state: AppState) -> Self {
        Self { tool_router: Self::tool_router(), state: Arc::new(state) }
    }

    /// Install and activate a cache generation.
    ///
    /// Fetches the configured asset list into the generation's precache store, then activates it and deletes
    /// every store belonging to other generations.
    #[tool(
        description = "Install a cache generation from the configured asset list and activate it. Fails if any asset cannot be fetched."
    )]
    async fn sw_install(&self, params: Parameters<SwInstallParams>) -> Result<CallToolResult, McpError> {
        install_impl(&self.state, params.0).await
    }

    /// Run a request through the active generation.
    #[tool(
        description = "Fetch a URL through the caching worker. Reports whether the worker or the network answered, with status, type, headers and body."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.state, params.0).await
    }

    #[tool(description = "List cache stores with entry counts and the active generation.")]
    async fn cache_stores(&self) -> Result<CallToolResult, McpError> {
        stores_impl(&self.state).await
    }

    #[tool(description = "Look up a stored response by URL and method. Searches the active runtime store unless a store is named.")]
    async fn cache_match(&self, params: Parameters<CacheMatchParams>) -> Result<CallToolResult, McpError> {
        match_impl(&self.state, params.0).await
    }
}

impl ServerHandler for OffcacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "offcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
