//! Per-identifier metadata maintained by the registry.

use super::{FactoryDescriptor, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Metadata record for one registered identifier.
///
/// Records are created at registration, mutated only by the registry while
/// it holds its state lock, and dropped on unregistration. Callers only ever
/// see clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityInfo {
    identifier: String,
    name: String,
    description: String,
    version: String,
    tags: Vec<String>,
    capabilities: BTreeSet<String>,
    status: Status,
    metadata: BTreeMap<String, Value>,
    last_error: Option<String>,
    registered_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EntityInfo {
    /// Creates a `registered` record from a factory descriptor.
    #[must_use]
    pub fn registered(descriptor: &FactoryDescriptor, timestamp: DateTime<Utc>) -> Self {
        Self {
            identifier: descriptor.identifier().to_owned(),
            name: descriptor.name().to_owned(),
            description: descriptor.description().to_owned(),
            version: descriptor.version().to_owned(),
            tags: descriptor.tags().to_vec(),
            capabilities: descriptor.capabilities().iter().cloned().collect(),
            status: Status::Registered,
            metadata: BTreeMap::new(),
            last_error: None,
            registered_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Returns the tool name or resource URI.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the factory version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the advertised capabilities.
    #[must_use]
    pub const fn capabilities(&self) -> &BTreeSet<String> {
        &self.capabilities
    }

    /// Returns the current lifecycle status.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Returns the free-form metadata map.
    #[must_use]
    pub const fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// Returns the message recorded by the most recent demotion to `error`.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns the registration timestamp.
    #[must_use]
    pub const fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub(crate) fn set_status(&mut self, status: Status, timestamp: DateTime<Utc>) {
        self.status = status;
        if status != Status::Error {
            self.last_error = None;
        }
        self.updated_at = timestamp;
    }

    pub(crate) fn mark_error(&mut self, message: impl Into<String>, timestamp: DateTime<Utc>) {
        self.status = Status::Error;
        self.last_error = Some(message.into());
        self.updated_at = timestamp;
    }

    pub(crate) fn insert_metadata(
        &mut self,
        key: impl Into<String>,
        value: Value,
        timestamp: DateTime<Utc>,
    ) {
        self.metadata.insert(key.into(), value);
        self.updated_at = timestamp;
    }
}
