//! Whole-registry load and validation passes.

use super::{Breaker, Registry};
use crate::registry::{
    domain::Status,
    ports::{Entity, EntityConfig, Factory},
    resilience::CreationError,
    services::{EntityFailure, RegistryError, RegistryResult},
    validation::ValidationErrors,
};
use mockable::Clock;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

struct LiveEntry<E, C>
where
    E: Entity,
    C: Clock + Send + Sync,
{
    identifier: String,
    entity: Arc<E>,
    factory: Arc<dyn Factory<E>>,
    breaker: Breaker<E, C>,
    config: EntityConfig,
}

impl<E, C> Registry<E, C>
where
    E: Entity,
    C: Clock + Send + Sync,
{
    /// Creates every entry still in `registered`.
    ///
    /// Each failure moves its entry to `error` and is collected; the pass
    /// continues with the next identifier. Entries unregistered while the
    /// pass runs are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Cancelled`] when `cancellation` fires, and
    /// [`RegistryError::BulkOperationFailed`] listing every failed identifier
    /// otherwise.
    pub async fn load_all(&self, cancellation: &CancellationToken) -> RegistryResult<()> {
        const OPERATION: &str = "load_all";

        if cancellation.is_cancelled() {
            return Err(RegistryError::Cancelled {
                operation: OPERATION,
            });
        }
        let pending: Vec<String> = self
            .read_state()
            .metadata
            .iter()
            .filter(|(_, info)| info.status() == Status::Registered)
            .map(|(identifier, _)| identifier.clone())
            .collect();

        let mut failures = Vec::new();
        for identifier in &pending {
            if cancellation.is_cancelled() {
                return Err(RegistryError::Cancelled {
                    operation: OPERATION,
                });
            }
            match self.get_with_cancellation(cancellation, identifier).await {
                Ok(_) | Err(RegistryError::NotFound { .. }) => {}
                Err(RegistryError::CreationFailed {
                    source: CreationError::Cancelled,
                    ..
                }) if cancellation.is_cancelled() => {
                    return Err(RegistryError::Cancelled {
                        operation: OPERATION,
                    });
                }
                Err(err) => failures.push(EntityFailure::new(identifier.as_str(), err)),
            }
        }

        info!(
            kind = %E::KIND,
            attempted = pending.len(),
            failed = failures.len(),
            "load pass finished"
        );
        Self::aggregate(OPERATION, pending.len(), failures)
    }

    /// Re-validates every live entity and its factory configuration.
    ///
    /// Entries that pass move from `loaded` to `active`; entries that fail
    /// move to `error` and lose their live entity.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Cancelled`] when `cancellation` fires, and
    /// [`RegistryError::BulkOperationFailed`] listing every failed identifier
    /// otherwise.
    pub fn validate_all(&self, cancellation: &CancellationToken) -> RegistryResult<()> {
        const OPERATION: &str = "validate_all";

        if cancellation.is_cancelled() {
            return Err(RegistryError::Cancelled {
                operation: OPERATION,
            });
        }
        let live: Vec<LiveEntry<E, C>> = {
            let guard = self.read_state();
            guard
                .entities
                .iter()
                .filter_map(|(identifier, entity)| {
                    let factory = guard.factories.get(identifier)?;
                    let breaker = guard.breakers.get(identifier)?;
                    let config = guard.configs.get(identifier).cloned().unwrap_or_default();
                    Some(LiveEntry {
                        identifier: identifier.clone(),
                        entity: Arc::clone(entity),
                        factory: Arc::clone(factory),
                        breaker: Arc::clone(breaker),
                        config,
                    })
                })
                .collect()
        };

        let mut failures = Vec::new();
        for LiveEntry {
            identifier,
            entity,
            factory,
            breaker,
            config,
        } in &live
        {
            if cancellation.is_cancelled() {
                return Err(RegistryError::Cancelled {
                    operation: OPERATION,
                });
            }

            let mut errors = ValidationErrors::new();
            if let Err(found) = self.validator.validate_entity(entity.as_ref()) {
                errors.absorb(found);
            }
            if let Err(err) = factory.validate(config) {
                errors.push("config", identifier.as_str(), err.to_string());
            }

            if errors.has_errors() {
                warn!(
                    kind = %E::KIND,
                    id = %identifier,
                    error = %errors,
                    "validation pass rejected entity"
                );
                self.demote(identifier, breaker, &errors.to_string());
                failures.push(EntityFailure::new(
                    identifier.as_str(),
                    RegistryError::ValidationFailed {
                        identifier: identifier.clone(),
                        source: errors,
                    },
                ));
            } else {
                self.promote(identifier, breaker);
            }
        }

        info!(
            kind = %E::KIND,
            attempted = live.len(),
            failed = failures.len(),
            "validation pass finished"
        );
        Self::aggregate(OPERATION, live.len(), failures)
    }

    fn promote(&self, identifier: &str, breaker: &Breaker<E, C>) {
        let now = self.clock.utc();
        let mut guard = self.write_state();
        if !guard.is_registered_with(identifier, breaker) {
            return;
        }
        if let Some(info) = guard.metadata.get_mut(identifier)
            && info.status() == Status::Loaded
        {
            info.set_status(Status::Active, now);
        }
    }

    fn aggregate(
        operation: &'static str,
        attempted: usize,
        failures: Vec<EntityFailure>,
    ) -> RegistryResult<()> {
        if failures.is_empty() {
            return Ok(());
        }
        Err(RegistryError::BulkOperationFailed {
            kind: E::KIND,
            operation,
            attempted,
            failures,
        })
    }
}
