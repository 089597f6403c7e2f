//! Generation descriptor: the version token and the two store names it owns.

use serde::{Deserialize, Serialize};

use crate::Error;

const PRECACHE_PREFIX: &str = "precache-";
const RUNTIME_PREFIX: &str = "runtime-";

/// One version of the cached asset set.
///
/// Passed explicitly to every component that touches a store; there is no
/// ambient "current version".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Generation {
    version: String,
    precache: String,
    runtime: String,
}

impl Generation {
    /// Derive the store names for a version token.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the token is empty or contains whitespace.
    pub fn new(version: impl Into<String>) -> Result<Self, Error> {
        let version = version.into();
        if version.is_empty() {
            return Err(Error::InvalidInput("version token cannot be empty".into()));
        }
        if version.chars().any(char::is_whitespace) {
            return Err(Error::InvalidInput(format!("version token contains whitespace: {version:?}")));
        }

        Ok(Self {
            precache: format!("{PRECACHE_PREFIX}{version}"),
            runtime: format!("{RUNTIME_PREFIX}{version}"),
            version,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Store populated once at install.
    pub fn precache_store(&self) -> &str {
        &self.precache
    }

    /// Store populated lazily while serving requests.
    pub fn runtime_store(&self) -> &str {
        &self.runtime
    }

    /// Whether `name` is one of this generation's stores.
    pub fn owns(&self, name: &str) -> bool {
        name == self.precache || name == self.runtime
    }
}
