//! Factory contract for capability instantiation.

use super::{CreationContext, Entity, EntityConfig};
use crate::registry::domain::FactoryDescriptor;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for factory operations.
pub type FactoryResult<T> = Result<T, FactoryError>;

/// Stateless descriptor and constructor for one entity.
///
/// Implementations must be cheap to share: the registry holds each factory
/// behind an `Arc` and calls [`Factory::create`] without holding any lock.
#[async_trait]
pub trait Factory<E: Entity>: Send + Sync {
    /// Returns the static descriptor.
    fn descriptor(&self) -> &FactoryDescriptor;

    /// Creates a live entity.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError`] when the entity cannot be built.
    async fn create(&self, ctx: &CreationContext, config: &EntityConfig) -> FactoryResult<E>;

    /// Checks that `config` is acceptable to this factory.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError::InvalidConfig`] when a setting is rejected.
    fn validate(&self, config: &EntityConfig) -> FactoryResult<()>;

    /// Returns the tool name or resource URI.
    fn identifier(&self) -> &str {
        self.descriptor().identifier()
    }

    /// Returns the display name.
    fn name(&self) -> &str {
        self.descriptor().name()
    }

    /// Returns the description.
    fn description(&self) -> &str {
        self.descriptor().description()
    }

    /// Returns the version.
    fn version(&self) -> &str {
        self.descriptor().version()
    }

    /// Returns the tags.
    fn tags(&self) -> &[String] {
        self.descriptor().tags()
    }

    /// Returns the advertised capabilities.
    fn capabilities(&self) -> &[String] {
        self.descriptor().capabilities()
    }
}

/// Errors returned by factory implementations.
#[derive(Debug, Clone, Error)]
pub enum FactoryError {
    /// The supplied configuration was rejected.
    #[error("invalid factory configuration: {0}")]
    InvalidConfig(String),

    /// A dependency needed to build the entity is unavailable.
    #[error("factory dependency unavailable: {0}")]
    Unavailable(String),

    /// Generic construction failure.
    #[error("factory runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl FactoryError {
    /// Wraps a construction failure.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
