//! Unified error types for offcache.
//!
//! Each variant renders with a stable code prefix so hosts can match on it.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the caching intermediary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty version token).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Store database operation failed.
    #[error("STORE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// The named store does not exist (never opened, or deleted since).
    #[error("STORE_MISSING: {0}")]
    StoreMissing(String),

    /// Only GET responses can be written to a store.
    #[error("STORE_UNSUPPORTED_METHOD: {0}")]
    UnsupportedMethod(String),

    /// Writing the entry would exceed the storage quota.
    #[error("STORE_QUOTA_EXCEEDED: {0}")]
    QuotaExceeded(String),

    /// Stored entry could not be decoded.
    #[error("STORE_CORRUPT: {0}")]
    Corrupt(String),

    /// Network fetch failed before a response was produced.
    #[error("FETCH_FAILED: {0}")]
    FetchFailed(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// A precache asset could not be fetched; the whole install fails.
    #[error("INSTALL_FAILED: {url}: {reason}")]
    InstallFailed { url: String, reason: String },

    /// Lifecycle signal arrived in a state that cannot accept it.
    #[error("INVALID_STATE: cannot {action} while {state}")]
    InvalidState { action: &'static str, state: String },
}

impl Error {
    /// Whether this error came from the network rather than the store.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::FetchFailed(_) | Error::FetchTimeout(_) | Error::FetchTooLarge(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Corrupt(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) => -32602,
            Error::InvalidUrl(_) => -32003,
            Error::Database(_) | Error::MigrationFailed(_) | Error::Corrupt(_) => -32002,
            Error::StoreMissing(_) => -32001,
            Error::UnsupportedMethod(_) => -32004,
            Error::QuotaExceeded(_) => -32005,
            Error::FetchFailed(_) => -32008,
            Error::FetchTimeout(_) => -32006,
            Error::FetchTooLarge(_) => -32007,
            Error::InstallFailed { .. } => -32010,
            Error::InvalidState { .. } => -32011,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
