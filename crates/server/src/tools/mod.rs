//! MCP tool implementations.
//!
//! This module contains all tools exposed by the offcache server.

pub mod cache;
pub mod fetch;
pub mod install;

pub use fetch::{SwFetchOutput, SwFetchParams};
pub use install::SwInstallParams;

#[cfg(test)]
pub(crate) fn parse_output<T: serde::de::DeserializeOwned>(result: &rmcp::model::CallToolResult) -> T {
    let text = result.content.first().and_then(|c| c.as_text()).expect("Expected text content");
    serde_json::from_str(&text.text).unwrap()
}
