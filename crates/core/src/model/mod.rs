//! Request, response and generation types shared by every layer.

pub mod generation;
pub mod request;
pub mod response;

pub use generation::Generation;
pub use request::{CacheMode, Destination, Request, RequestKey, RequestMode};
pub use response::{Response, ResponseType};
