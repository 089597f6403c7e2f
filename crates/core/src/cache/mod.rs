//! Cache storage: named stores of request → response snapshots.
//!
//! - [`CacheStorage`] is the host store abstraction; [`Store`] a handle to one store
//! - [`CacheDb`] persists stores in SQLite (WAL mode, async via tokio-rusqlite)
//! - [`MemoryStorage`] keeps them in process memory

pub mod connection;
pub mod entries;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use memory::MemoryStorage;
pub use storage::{CacheStorage, Store};
