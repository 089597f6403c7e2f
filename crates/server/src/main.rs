//! offcache server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use offcache_client::{FetchConfig, HttpFetcher};
use offcache_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod state;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let scope = config.scope_url()?;

    tracing::info!(
        scope = %scope,
        version = %config.version,
        db_path = %config.db_path.display(),
        "Starting offcache server on stdio transport"
    );

    let storage = Arc::new(CacheDb::open(&config.db_path).await?);
    let fetcher = Arc::new(HttpFetcher::new(FetchConfig::from(&config), scope.origin())?);
    let state = state::AppState::new(config, storage, fetcher)?;

    let handler = handler::OffcacheServer::new(state);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
