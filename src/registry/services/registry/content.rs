//! Cached content reads for readable entities.

use super::Registry;
use crate::registry::{
    domain::{CachedContent, ResourceContent},
    ports::{EntityError, ReadableEntity},
    services::{RegistryError, RegistryResult},
};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio_util::sync::CancellationToken;
use tracing::debug;

impl<E, C> Registry<E, C>
where
    E: ReadableEntity,
    C: Clock + Send + Sync,
{
    /// Returns the content of `identifier`, serving fresh cached content when
    /// available.
    ///
    /// On a cache miss the entity is obtained through
    /// [`Registry::get_with_cancellation`] and read under the configured read
    /// timeout. Content is cached only while the entity is retained by the
    /// registry.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Registry::get_with_cancellation`],
    /// [`RegistryError::ReadFailed`] when the read fails or times out, and
    /// [`RegistryError::Cancelled`] when `cancellation` fires first.
    pub async fn read_content(
        &self,
        cancellation: &CancellationToken,
        identifier: &str,
    ) -> RegistryResult<ResourceContent> {
        if let Some(content) = self.cached_content(identifier, self.clock.utc()) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(content);
        }
        self.cache_misses.fetch_add(1, Ordering::Relaxed);

        let entity = self.get_with_cancellation(cancellation, identifier).await?;
        let read_timeout = self.config.read_timeout();
        let reader = cancellation.child_token();
        let outcome = tokio::select! {
            biased;
            () = cancellation.cancelled() => {
                return Err(RegistryError::Cancelled {
                    operation: "read_content",
                });
            }
            outcome = tokio::time::timeout(read_timeout, entity.read(&reader)) => outcome,
        };

        let content = match outcome {
            Ok(Ok(content)) => content,
            Ok(Err(source)) => {
                return Err(RegistryError::ReadFailed {
                    identifier: identifier.to_owned(),
                    source,
                });
            }
            Err(_) => {
                return Err(RegistryError::ReadFailed {
                    identifier: identifier.to_owned(),
                    source: EntityError::Timeout(read_timeout),
                });
            }
        };

        self.store_content(identifier, &entity, content.clone());
        Ok(content)
    }

    fn cached_content(&self, identifier: &str, now: DateTime<Utc>) -> Option<ResourceContent> {
        let mut cache = self.write_cache();
        let entry = cache.get_mut(identifier)?;
        if entry.is_expired(now) {
            cache.remove(identifier);
            debug!(kind = %E::KIND, id = identifier, "cached content expired");
            return None;
        }
        Some(entry.record_access())
    }

    fn store_content(&self, identifier: &str, entity: &Arc<E>, content: ResourceContent) {
        if !self.config.caching_enabled() {
            return;
        }
        let ttl = TimeDelta::from_std(self.config.cache_ttl()).unwrap_or(TimeDelta::MAX);
        let now = self.clock.utc();

        // The state and cache locks are never held together. The second
        // retention check catches a refresh or removal landing in between.
        if !self.is_retained(identifier, entity) {
            return;
        }
        let mut cache = self.write_cache();
        cache.insert(identifier.to_owned(), CachedContent::new(content, now, ttl));
        let limit = self.config.max_cache_entries;
        if cache.len() > limit {
            cache.retain(|_, entry| !entry.is_expired(now));
        }
        while cache.len() > limit {
            let Some(oldest) = cache
                .iter()
                .filter(|(key, _)| key.as_str() != identifier)
                .min_by_key(|(_, entry)| entry.cached_at())
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            cache.remove(&oldest);
            debug!(kind = %E::KIND, id = %oldest, "evicted cached content");
        }
        drop(cache);

        if !self.is_retained(identifier, entity) {
            self.evict_content(identifier);
        }
    }

    fn is_retained(&self, identifier: &str, entity: &Arc<E>) -> bool {
        self.read_state()
            .entities
            .get(identifier)
            .is_some_and(|current| Arc::ptr_eq(current, entity))
    }
}
