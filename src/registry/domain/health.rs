//! Derived health snapshots for a registry.

use super::{EntityKind, ParseHealthStatusError, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Overall health of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Running with no entries in `error`.
    Healthy,
    /// Running with at least one entry in `error`.
    Degraded,
    /// Not running.
    Stopped,
}

impl HealthStatus {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for HealthStatus {
    type Error = ParseHealthStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "healthy" => Ok(Self::Healthy),
            "degraded" => Ok(Self::Degraded),
            "stopped" => Ok(Self::Stopped),
            _ => Err(ParseHealthStatusError(value.to_owned())),
        }
    }
}

/// Content cache statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheHealth {
    size: usize,
    hits: u64,
    misses: u64,
    hit_rate: f64,
}

impl CacheHealth {
    /// Creates cache statistics; the hit rate is `hits / (hits + misses)`,
    /// or zero before any lookup.
    #[must_use]
    pub fn new(size: usize, hits: u64, misses: u64) -> Self {
        let lookups = hits.saturating_add(misses);
        #[expect(
            clippy::cast_precision_loss,
            clippy::float_arithmetic,
            reason = "hit rate is a reporting ratio; precision beyond 2^53 lookups is irrelevant"
        )]
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64
        };
        Self {
            size,
            hits,
            misses,
            hit_rate,
        }
    }

    /// Returns the number of cached entries.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Returns the number of cache hits.
    #[must_use]
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    /// Returns the number of cache misses.
    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.misses
    }

    /// Returns the hit rate in `[0, 1]`.
    #[must_use]
    pub const fn hit_rate(&self) -> f64 {
        self.hit_rate
    }
}

/// Point-in-time health snapshot, recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryHealth {
    status: HealthStatus,
    kind: EntityKind,
    entities: BTreeMap<String, Status>,
    circuit_breakers: BTreeMap<String, String>,
    cache: CacheHealth,
    started_at: Option<DateTime<Utc>>,
    uptime_secs: Option<i64>,
    checked_at: DateTime<Utc>,
}

impl RegistryHealth {
    /// Assembles a snapshot, deriving the overall status from `running` and
    /// the per-identifier statuses.
    #[must_use]
    pub fn new(
        kind: EntityKind,
        running: bool,
        entities: BTreeMap<String, Status>,
        circuit_breakers: BTreeMap<String, String>,
        cache: CacheHealth,
        started_at: Option<DateTime<Utc>>,
        checked_at: DateTime<Utc>,
    ) -> Self {
        let status = if !running {
            HealthStatus::Stopped
        } else if entities.values().any(|status| *status == Status::Error) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        let uptime_secs = started_at
            .filter(|_| running)
            .map(|started| checked_at.signed_duration_since(started).num_seconds());
        Self {
            status,
            kind,
            entities,
            circuit_breakers,
            cache,
            started_at,
            uptime_secs,
            checked_at,
        }
    }

    /// Returns the overall status.
    #[must_use]
    pub const fn status(&self) -> HealthStatus {
        self.status
    }

    /// Returns the entity kind the registry serves.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Returns the number of registered identifiers.
    #[must_use]
    pub fn total(&self) -> usize {
        self.entities.len()
    }

    /// Returns the status of every registered identifier.
    #[must_use]
    pub const fn entities(&self) -> &BTreeMap<String, Status> {
        &self.entities
    }

    /// Returns the number of identifiers in `status`.
    #[must_use]
    pub fn count_in(&self, status: Status) -> usize {
        self.entities.values().filter(|&&value| value == status).count()
    }

    /// Returns the breaker status string of every registered identifier.
    #[must_use]
    pub const fn circuit_breakers(&self) -> &BTreeMap<String, String> {
        &self.circuit_breakers
    }

    /// Returns content cache statistics.
    #[must_use]
    pub const fn cache(&self) -> &CacheHealth {
        &self.cache
    }

    /// Returns when the registry was last started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns whole seconds since start while running.
    #[must_use]
    pub const fn uptime_secs(&self) -> Option<i64> {
        self.uptime_secs
    }

    /// Returns when the snapshot was taken.
    #[must_use]
    pub const fn checked_at(&self) -> DateTime<Utc> {
        self.checked_at
    }
}
