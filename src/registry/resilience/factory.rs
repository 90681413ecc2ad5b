//! Circuit-breaker wrapper around one registered factory.

use super::{CircuitBreaker, CircuitBreakerError, CircuitState, Counts};
use crate::registry::{
    domain::CircuitBreakerConfig,
    ports::{CreationContext, Entity, EntityConfig, Factory, FactoryError},
};
use mockable::Clock;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Reasons a breaker-guarded creation attempt produced no entity.
#[derive(Debug, Clone, Error)]
pub enum CreationError {
    /// The breaker is open; the factory was not called.
    #[error("circuit open for '{0}'")]
    CircuitOpen(String),

    /// The half-open trial budget is exhausted; the factory was not called.
    #[error("circuit half-open for '{0}' with no trial requests left")]
    TooManyRequests(String),

    /// The factory did not finish within its time budget.
    #[error("creation timed out after {0:?}")]
    TimedOut(Duration),

    /// The caller cancelled the attempt.
    #[error("creation cancelled")]
    Cancelled,

    /// The factory reported a failure.
    #[error(transparent)]
    Factory(#[from] FactoryError),
}

impl CreationError {
    /// Returns whether the breaker rejected the call without running it.
    #[must_use]
    pub const fn is_circuit_rejection(&self) -> bool {
        matches!(self, Self::CircuitOpen(_) | Self::TooManyRequests(_))
    }
}

/// A factory whose `create` calls pass through a dedicated circuit breaker.
pub struct CircuitBreakerFactory<E, C>
where
    E: Entity,
    C: Clock + Send + Sync,
{
    factory: Arc<dyn Factory<E>>,
    breaker: CircuitBreaker<C>,
}

impl<E, C> fmt::Debug for CircuitBreakerFactory<E, C>
where
    E: Entity,
    C: Clock + Send + Sync,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CircuitBreakerFactory")
            .field("identifier", &self.factory.identifier())
            .field("breaker", &self.breaker)
            .finish()
    }
}

impl<E, C> CircuitBreakerFactory<E, C>
where
    E: Entity,
    C: Clock + Send + Sync,
{
    /// Wraps `factory` with a breaker named after its identifier.
    #[must_use]
    pub fn new(factory: Arc<dyn Factory<E>>, config: CircuitBreakerConfig, clock: Arc<C>) -> Self {
        let breaker = CircuitBreaker::new(factory.identifier(), config, clock);
        Self { factory, breaker }
    }

    /// Returns the wrapped factory.
    #[must_use]
    pub fn factory(&self) -> &Arc<dyn Factory<E>> {
        &self.factory
    }

    /// Returns the current breaker state.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Returns the breaker counts for the current window.
    #[must_use]
    pub fn counts(&self) -> Counts {
        self.breaker.counts()
    }

    /// Returns a human-readable breaker summary.
    #[must_use]
    pub fn status(&self) -> String {
        self.breaker.status()
    }

    /// Creates an entity through the breaker.
    ///
    /// The factory call is bounded by the context timeout; timeouts and
    /// factory errors count as breaker failures. Cancellation through the
    /// context token returns promptly and is not counted.
    ///
    /// # Errors
    ///
    /// Returns [`CreationError`] when the breaker rejects the call, the
    /// factory fails or times out, or the context is cancelled.
    pub async fn create(
        &self,
        ctx: &CreationContext,
        config: &EntityConfig,
    ) -> Result<E, CreationError> {
        let guarded = self.breaker.execute(|| async {
            match tokio::time::timeout(ctx.timeout(), self.factory.create(ctx, config)).await {
                Ok(result) => result.map_err(CreationError::Factory),
                Err(_) => Err(CreationError::TimedOut(ctx.timeout())),
            }
        });

        tokio::select! {
            biased;
            () = ctx.cancellation_token().cancelled() => Err(CreationError::Cancelled),
            outcome = guarded => outcome.map_err(|err| match err {
                CircuitBreakerError::Open(name) => CreationError::CircuitOpen(name),
                CircuitBreakerError::TooManyRequests(name) => CreationError::TooManyRequests(name),
                CircuitBreakerError::Inner(inner) => inner,
            }),
        }
    }
}
