//! Registry health snapshot.

use super::Registry;
use crate::registry::{
    domain::{CacheHealth, EntityInfo, RegistryHealth},
    ports::Entity,
};
use mockable::Clock;
use std::collections::BTreeMap;
use std::sync::atomic::Ordering;

impl<E, C> Registry<E, C>
where
    E: Entity,
    C: Clock + Send + Sync,
{
    /// Returns a point-in-time health snapshot.
    ///
    /// The overall status is `stopped` while not running, `degraded` when any
    /// entry is in `error`, and `healthy` otherwise.
    #[must_use]
    pub fn health(&self) -> RegistryHealth {
        let (running, started_at, entities, circuit_breakers) = {
            let guard = self.read_state();
            let entities = guard
                .metadata
                .iter()
                .map(|(identifier, info)| (identifier.clone(), EntityInfo::status(info)))
                .collect();
            let circuit_breakers: BTreeMap<_, _> = guard
                .breakers
                .iter()
                .map(|(identifier, breaker)| (identifier.clone(), breaker.status()))
                .collect();
            (guard.running, guard.started_at, entities, circuit_breakers)
        };

        let cache = CacheHealth::new(
            self.read_cache().len(),
            self.cache_hits.load(Ordering::Relaxed),
            self.cache_misses.load(Ordering::Relaxed),
        );

        RegistryHealth::new(
            E::KIND,
            running,
            entities,
            circuit_breakers,
            cache,
            started_at,
            self.clock.utc(),
        )
    }
}
