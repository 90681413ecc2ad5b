//! Per-call context and configuration handed to factories.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Context passed to [`super::Factory::create`].
///
/// The token is a child of the caller's token: it is cancelled when the
/// caller cancels, and factories that run long should observe it.
#[derive(Debug, Clone)]
pub struct CreationContext {
    identifier: String,
    cancellation: CancellationToken,
    timeout: Duration,
}

impl CreationContext {
    /// Creates a context for one creation attempt.
    #[must_use]
    pub fn new(
        identifier: impl Into<String>,
        cancellation: CancellationToken,
        timeout: Duration,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            cancellation,
            timeout,
        }
    }

    /// Returns the identifier being instantiated.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the cancellation token for this attempt.
    #[must_use]
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns whether the attempt has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Returns the time budget for this attempt.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Opaque per-factory settings supplied at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityConfig(Map<String, Value>);

impl EntityConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a setting.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns a setting by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns a string setting by key.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns an unsigned integer setting by key.
    #[must_use]
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    /// Returns the underlying map.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for EntityConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
