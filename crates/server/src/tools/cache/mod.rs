//! Store inspection MCP tools.
//!
//! Read-only views of the cache storage; only the lifecycle creates or
//! deletes stores.

pub mod get;
pub mod stores;

pub use get::{CacheMatchParams, match_impl};
pub use stores::stores_impl;
