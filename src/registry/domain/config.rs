//! Registry and circuit breaker configuration.
//!
//! Both structs deserialize with defaults for missing fields so they can be
//! embedded in whatever configuration source the host application uses.
//! Bounds are checked by
//! [`crate::registry::validation::EntityValidator::validate_config`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`crate::registry::services::Registry`].
///
/// # Examples
///
/// ```
/// use capability_registry::registry::domain::RegistryConfig;
///
/// let config = RegistryConfig::default();
/// assert_eq!(config.creation_timeout_secs, 30);
///
/// let uncached = RegistryConfig::uncached();
/// assert_eq!(uncached.max_cache_entries, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Upper bound on a single factory `create` call, in seconds.
    pub creation_timeout_secs: u64,
    /// Upper bound on a single resource read, in seconds.
    pub read_timeout_secs: u64,
    /// Time-to-live for cached resource content, in seconds.
    pub cache_ttl_secs: u64,
    /// Maximum number of cached content entries; zero disables caching.
    pub max_cache_entries: usize,
    /// Breaker settings applied to every registered factory.
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            creation_timeout_secs: 30,
            read_timeout_secs: 30,
            cache_ttl_secs: 300,
            max_cache_entries: 1_000,
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl RegistryConfig {
    /// Creates a configuration that never caches resource content.
    #[must_use]
    pub fn uncached() -> Self {
        Self {
            max_cache_entries: 0,
            ..Self::default()
        }
    }

    /// Returns the factory creation timeout.
    #[must_use]
    pub const fn creation_timeout(&self) -> Duration {
        Duration::from_secs(self.creation_timeout_secs)
    }

    /// Returns the resource read timeout.
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Returns the cached content time-to-live.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Returns whether resource content is cached at all.
    #[must_use]
    pub const fn caching_enabled(&self) -> bool {
        self.max_cache_entries > 0 && self.cache_ttl_secs > 0
    }
}

/// Failure-ratio circuit breaker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Trial calls admitted while half-open; the same number of consecutive
    /// successes closes the circuit.
    pub max_half_open_requests: u32,
    /// Rolling window after which closed-state counts reset, in seconds.
    /// Zero keeps counts until the next state change.
    pub reset_interval_secs: u64,
    /// Time spent open before admitting trial calls, in seconds.
    pub open_timeout_secs: u64,
    /// Requests needed in the window before the failure ratio is considered.
    pub min_requests: u32,
    /// Failure ratio, in percent, at which the circuit opens.
    pub failure_ratio_percent: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            max_half_open_requests: 3,
            reset_interval_secs: 10,
            open_timeout_secs: 30,
            min_requests: 3,
            failure_ratio_percent: 60,
        }
    }
}

impl CircuitBreakerConfig {
    /// Returns the closed-state counting window.
    #[must_use]
    pub const fn reset_interval(&self) -> Duration {
        Duration::from_secs(self.reset_interval_secs)
    }

    /// Returns the open-state timeout.
    #[must_use]
    pub const fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_secs)
    }
}
