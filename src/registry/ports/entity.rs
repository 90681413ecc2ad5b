//! Live capability instances.

use crate::registry::domain::{EntityKind, ResourceContent};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Result type for entity operations.
pub type EntityResult<T> = Result<T, EntityError>;

/// A live tool or resource produced by a factory.
pub trait Entity: Send + Sync + 'static {
    /// Kind of capability this entity represents.
    const KIND: EntityKind;

    /// Returns the entity name.
    fn name(&self) -> &str;

    /// Returns the entity description.
    fn description(&self) -> &str;

    /// Returns whether a handler is attached.
    fn has_handler(&self) -> bool;
}

/// Entities whose content can be read and cached.
#[async_trait]
pub trait ReadableEntity: Entity {
    /// Reads the current content.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError`] when no handler is attached or the read fails.
    async fn read(&self, cancellation: &CancellationToken) -> EntityResult<ResourceContent>;
}

/// Errors raised by live entities.
#[derive(Debug, Clone, Error)]
pub enum EntityError {
    /// The entity has no handler attached.
    #[error("entity '{0}' has no handler")]
    MissingHandler(String),

    /// The arguments supplied to the entity were rejected.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The handler did not finish within its time budget.
    #[error("entity handler timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Generic handler failure.
    #[error("entity handler error: {0}")]
    Handler(Arc<dyn std::error::Error + Send + Sync>),
}

impl EntityError {
    /// Wraps a handler failure.
    pub fn handler(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Handler(Arc::new(err))
    }
}
