//! Core types and shared functionality for offcache.
//!
//! This crate provides:
//! - Request/response/generation data model
//! - Cache storage abstraction with SQLite and in-memory backends
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod model;

pub use cache::{CacheDb, CacheStorage, MemoryStorage, Store};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use model::{Generation, Request, RequestKey, Response, ResponseType};
