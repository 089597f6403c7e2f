//! Structured errors for the offcache host adapter.
//!
//! Worker and store failures arrive as `offcache_core::Error` and convert on
//! their own; these cover what only the adapter can get wrong.

use offcache_core::ConfigError;
use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Structured errors for the offcache host adapter.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration could not produce a generation or asset list.
    #[error("CONFIG_INVALID: {0}")]
    Config(#[from] ConfigError),

    /// Tool output could not be serialized.
    #[error("SERIALIZE_FAILED: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<ServerError> for McpError {
    fn from(err: ServerError) -> Self {
        let code = match &err {
            ServerError::Config(_) => -32012,
            ServerError::Serialize(_) => -32603,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
