//! Domain model for capability registration and lifecycle.
//!
//! Statuses, the transition table, per-identifier metadata, cached content,
//! and health snapshots live here. Nothing in this module performs I/O or
//! takes locks.

mod cache;
mod config;
mod descriptor;
mod error;
mod health;
mod info;
mod kind;
mod status;

pub use cache::{CachedContent, ContentBody, ResourceContent};
pub use config::{CircuitBreakerConfig, RegistryConfig};
pub use descriptor::FactoryDescriptor;
pub use error::{ParseEntityKindError, ParseHealthStatusError, ParseStatusError};
pub use health::{CacheHealth, HealthStatus, RegistryHealth};
pub use info::EntityInfo;
pub use kind::EntityKind;
pub use status::{Status, StatusStateMachine};
