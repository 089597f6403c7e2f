//! Client code for offcache.
//!
//! This crate provides the network fetch capability, request classification,
//! the caching strategies, the generation lifecycle and the worker facade the
//! host adapter drives.

pub mod background;
pub mod classify;
pub mod dispatch;
pub mod fetch;
pub mod lifecycle;
pub mod registration;
pub mod strategy;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use background::Background;
pub use classify::{Classification, Classifier, Strategy};
pub use dispatch::{Dispatch, Dispatcher};
pub use fetch::{FetchConfig, FetchOptions, Fetcher, HttpFetcher};
pub use lifecycle::{ActivateReport, GenerationState, InstallReport, Lifecycle};
pub use registration::{Installation, Registration};
pub use strategy::Strategies;
pub use worker::ServiceWorker;
