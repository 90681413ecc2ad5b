//! Registry state, registration, lazy instantiation, and status control.

mod bulk;
mod content;
mod health;

use super::{RegistryError, RegistryResult};
use crate::registry::{
    domain::{CachedContent, EntityInfo, EntityKind, RegistryConfig, Status, StatusStateMachine},
    ports::{CreationContext, Entity, EntityConfig, Factory},
    resilience::{CircuitBreakerFactory, CreationError},
    validation::{EntityValidator, ValidationErrors},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lifecycle registry for one entity kind.
///
/// The registry owns every factory, breaker, live entity, and metadata record
/// for its kind. Two independent locks guard disjoint state: one for the
/// factory/entity/metadata maps and one for the content cache. Factory
/// creation and content reads always run with neither lock held.
///
/// Creation of a never-instantiated identifier is not deduplicated: two
/// concurrent first-time [`Registry::get`] calls may both invoke the factory.
/// The first instance to be stored is retained and returned to both callers.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use capability_registry::registry::{
///     adapters::{InMemoryToolFactory, ToolRegistry},
///     domain::Status,
///     ports::Entity,
/// };
/// use mockable::DefaultClock;
///
/// # #[tokio::main(flavor = "multi_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let registry: ToolRegistry<DefaultClock> = ToolRegistry::new(Arc::new(DefaultClock));
/// registry.register("echo", Arc::new(InMemoryToolFactory::echo("echo")))?;
/// registry.start()?;
///
/// let tool = registry.get("echo").await?;
/// assert_eq!(tool.name(), "echo");
/// assert_eq!(registry.status("echo")?, Status::Loaded);
/// # Ok(())
/// # }
/// ```
pub struct Registry<E, C>
where
    E: Entity,
    C: Clock + Send + Sync,
{
    config: RegistryConfig,
    validator: EntityValidator,
    clock: Arc<C>,
    state: RwLock<RegistryState<E, C>>,
    cache: RwLock<HashMap<String, CachedContent>>,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

type Breaker<E, C> = Arc<CircuitBreakerFactory<E, C>>;

struct RegistryState<E, C>
where
    E: Entity,
    C: Clock + Send + Sync,
{
    factories: HashMap<String, Arc<dyn Factory<E>>>,
    breakers: HashMap<String, Breaker<E, C>>,
    entities: HashMap<String, Arc<E>>,
    metadata: BTreeMap<String, EntityInfo>,
    configs: HashMap<String, EntityConfig>,
    running: bool,
    started_at: Option<DateTime<Utc>>,
}

impl<E, C> Default for RegistryState<E, C>
where
    E: Entity,
    C: Clock + Send + Sync,
{
    fn default() -> Self {
        Self {
            factories: HashMap::new(),
            breakers: HashMap::new(),
            entities: HashMap::new(),
            metadata: BTreeMap::new(),
            configs: HashMap::new(),
            running: false,
            started_at: None,
        }
    }
}

impl<E, C> RegistryState<E, C>
where
    E: Entity,
    C: Clock + Send + Sync,
{
    // Each registration owns a fresh breaker, so pointer identity tells a
    // re-registered identifier apart from the one an operation started with.
    fn is_registered_with(&self, identifier: &str, breaker: &Breaker<E, C>) -> bool {
        self.breakers
            .get(identifier)
            .is_some_and(|current| Arc::ptr_eq(current, breaker))
    }
}

impl<E, C> Registry<E, C>
where
    E: Entity,
    C: Clock + Send + Sync,
{
    /// Creates a stopped registry with default configuration.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self::build(RegistryConfig::default(), EntityValidator::new(), clock)
    }

    /// Creates a stopped registry with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidConfig`] when a timeout, cache size,
    /// or breaker threshold is out of bounds.
    pub fn with_config(config: RegistryConfig, clock: Arc<C>) -> RegistryResult<Self> {
        let validator = EntityValidator::new();
        validator
            .validate_config(&config)
            .map_err(RegistryError::InvalidConfig)?;
        Ok(Self::build(config, validator, clock))
    }

    /// Replaces the validator used for identifiers, factories, and entities.
    #[must_use]
    pub fn with_validator(mut self, validator: EntityValidator) -> Self {
        self.validator = validator;
        self
    }

    fn build(config: RegistryConfig, validator: EntityValidator, clock: Arc<C>) -> Self {
        Self {
            config,
            validator,
            clock,
            state: RwLock::new(RegistryState::default()),
            cache: RwLock::new(HashMap::new()),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
        }
    }

    /// Returns the entity kind served by this registry.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        E::KIND
    }

    /// Returns the registry configuration.
    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Registers `factory` under `identifier` with an empty configuration.
    ///
    /// # Errors
    ///
    /// See [`Registry::register_with_config`].
    pub fn register(&self, identifier: &str, factory: Arc<dyn Factory<E>>) -> RegistryResult<()> {
        self.register_with_config(identifier, factory, EntityConfig::default())
    }

    /// Registers `factory` under `identifier`, storing `config` for every
    /// later creation call.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidIdentifier`] when the identifier is
    /// malformed or differs from the factory's own identifier,
    /// [`RegistryError::ValidationFailed`] when the descriptor or
    /// configuration is rejected, and [`RegistryError::AlreadyExists`] when
    /// the identifier is taken. No state changes on error.
    pub fn register_with_config(
        &self,
        identifier: &str,
        factory: Arc<dyn Factory<E>>,
        config: EntityConfig,
    ) -> RegistryResult<()> {
        let mut identifier_errors = ValidationErrors::new();
        if let Err(errors) = self.validator.validate_identifier(E::KIND, identifier) {
            identifier_errors.absorb(errors);
        }
        if factory.identifier() != identifier {
            identifier_errors.push(
                "identifier",
                identifier,
                format!(
                    "does not match factory identifier '{}'",
                    factory.identifier()
                ),
            );
        }
        if identifier_errors.has_errors() {
            return Err(RegistryError::InvalidIdentifier {
                identifier: identifier.to_owned(),
                source: identifier_errors,
            });
        }

        let mut factory_errors = ValidationErrors::new();
        if let Err(errors) = self.validator.validate_factory(factory.as_ref()) {
            factory_errors.absorb(errors);
        }
        if let Err(err) = factory.validate(&config) {
            factory_errors.push("config", identifier, err.to_string());
        }
        if factory_errors.has_errors() {
            return Err(RegistryError::ValidationFailed {
                identifier: identifier.to_owned(),
                source: factory_errors,
            });
        }

        let breaker = Arc::new(CircuitBreakerFactory::new(
            Arc::clone(&factory),
            self.config.circuit_breaker.clone(),
            Arc::clone(&self.clock),
        ));
        let info = EntityInfo::registered(factory.descriptor(), self.clock.utc());

        let mut guard = self.write_state();
        if guard.factories.contains_key(identifier) {
            return Err(RegistryError::AlreadyExists {
                kind: E::KIND,
                identifier: identifier.to_owned(),
            });
        }
        let key = identifier.to_owned();
        guard.factories.insert(key.clone(), factory);
        guard.breakers.insert(key.clone(), breaker);
        guard.configs.insert(key.clone(), config);
        guard.metadata.insert(key, info);
        drop(guard);

        info!(kind = %E::KIND, id = identifier, "registered factory");
        Ok(())
    }

    /// Removes every trace of `identifier`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the identifier is absent.
    pub fn unregister(&self, identifier: &str) -> RegistryResult<()> {
        let mut guard = self.write_state();
        if guard.factories.remove(identifier).is_none() {
            return Err(Self::not_found(identifier));
        }
        guard.breakers.remove(identifier);
        guard.entities.remove(identifier);
        guard.metadata.remove(identifier);
        guard.configs.remove(identifier);
        drop(guard);

        self.evict_content(identifier);
        info!(kind = %E::KIND, id = identifier, "unregistered factory");
        Ok(())
    }

    /// Returns the live entity for `identifier`, creating it on first use.
    ///
    /// # Errors
    ///
    /// See [`Registry::get_with_cancellation`].
    pub async fn get(&self, identifier: &str) -> RegistryResult<Arc<E>> {
        self.get_with_cancellation(&CancellationToken::new(), identifier)
            .await
    }

    /// Returns the live entity for `identifier`, creating it on first use
    /// under a context derived from `cancellation`.
    ///
    /// A newly created entity is validated and retained while its entry moves
    /// to `loaded`. When the entry's status cannot reach `loaded` (for example
    /// after [`Registry::stop`] disabled it) the fresh entity is returned to
    /// the caller without being retained.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown identifiers and for
    /// identifiers unregistered or re-registered while creation ran,
    /// [`RegistryError::CreationFailed`] when the breaker rejects the call or
    /// the factory fails, times out, or is cancelled, and
    /// [`RegistryError::ValidationFailed`] when the created entity is invalid.
    /// Creation and validation failures move the entry to `error`.
    pub async fn get_with_cancellation(
        &self,
        cancellation: &CancellationToken,
        identifier: &str,
    ) -> RegistryResult<Arc<E>> {
        {
            let guard = self.read_state();
            if let Some(entity) = guard.entities.get(identifier) {
                return Ok(Arc::clone(entity));
            }
            if !guard.factories.contains_key(identifier) {
                return Err(Self::not_found(identifier));
            }
        }

        let (entity, breaker) = self.create_entity(cancellation, identifier).await?;
        self.retain(identifier, &breaker, Arc::new(entity))
    }

    /// Returns the factory registered under `identifier`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the identifier is absent.
    pub fn get_factory(&self, identifier: &str) -> RegistryResult<Arc<dyn Factory<E>>> {
        self.read_state()
            .factories
            .get(identifier)
            .cloned()
            .ok_or_else(|| Self::not_found(identifier))
    }

    /// Returns a snapshot of every metadata record, ordered by identifier.
    #[must_use]
    pub fn list(&self) -> Vec<EntityInfo> {
        self.read_state().metadata.values().cloned().collect()
    }

    /// Returns the metadata record for `identifier`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the identifier is absent.
    pub fn info(&self, identifier: &str) -> RegistryResult<EntityInfo> {
        self.read_state()
            .metadata
            .get(identifier)
            .cloned()
            .ok_or_else(|| Self::not_found(identifier))
    }

    /// Returns the current status of `identifier`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the identifier is absent.
    pub fn status(&self, identifier: &str) -> RegistryResult<Status> {
        self.read_state()
            .metadata
            .get(identifier)
            .map(EntityInfo::status)
            .ok_or_else(|| Self::not_found(identifier))
    }

    /// Stores a free-form metadata value on `identifier`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the identifier is absent.
    pub fn set_metadata(
        &self,
        identifier: &str,
        key: impl Into<String>,
        value: Value,
    ) -> RegistryResult<()> {
        let now = self.clock.utc();
        let mut guard = self.write_state();
        let info = guard
            .metadata
            .get_mut(identifier)
            .ok_or_else(|| Self::not_found(identifier))?;
        info.insert_metadata(key, value, now);
        Ok(())
    }

    /// Returns the number of registered identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_state().factories.len()
    }

    /// Returns whether no identifier is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_state().factories.is_empty()
    }

    /// Returns whether the registry is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.read_state().running
    }

    /// Moves `identifier` to `target` after checking the transition table.
    ///
    /// Entering `disabled` or `error` drops the live entity and any cached
    /// content for the identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown identifiers,
    /// [`RegistryError::RegistryNotRunning`] when `target` is `loaded` or
    /// `active` and the registry is stopped, and
    /// [`RegistryError::InvalidTransition`] when the table forbids the move.
    pub fn transition_status(&self, identifier: &str, target: Status) -> RegistryResult<()> {
        let now = self.clock.utc();
        let mut guard = self.write_state();
        let state = &mut *guard;
        let running = state.running;
        let info = state
            .metadata
            .get_mut(identifier)
            .ok_or_else(|| Self::not_found(identifier))?;

        if target.requires_running_registry() && !running {
            return Err(RegistryError::RegistryNotRunning {
                identifier: identifier.to_owned(),
                target,
            });
        }

        let from = info.status();
        if !StatusStateMachine::is_valid_transition(from, target) {
            return Err(RegistryError::InvalidTransition {
                identifier: identifier.to_owned(),
                from,
                to: target,
            });
        }

        info.set_status(target, now);
        if target.purges_on_entry() {
            state.entities.remove(identifier);
        }
        drop(guard);

        if target.purges_on_entry() {
            self.evict_content(identifier);
        }
        debug!(kind = %E::KIND, id = identifier, %from, to = %target, "status transition");
        Ok(())
    }

    /// Recreates the entity for `identifier`, bypassing the retained
    /// instance, and replaces it after validation.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown identifiers,
    /// [`RegistryError::RefreshNotAllowed`] unless the entry is `loaded` or
    /// `active`, and creation or validation errors as for
    /// [`Registry::get_with_cancellation`], which also move the entry to
    /// `error`.
    pub async fn refresh(
        &self,
        cancellation: &CancellationToken,
        identifier: &str,
    ) -> RegistryResult<()> {
        let status = self.status(identifier)?;
        if !status.can_refresh() {
            return Err(RegistryError::RefreshNotAllowed {
                identifier: identifier.to_owned(),
                status,
            });
        }

        let (entity, breaker) = self.create_entity(cancellation, identifier).await?;

        let now = self.clock.utc();
        let mut guard = self.write_state();
        let state = &mut *guard;
        if !state.is_registered_with(identifier, &breaker) {
            return Err(Self::not_found(identifier));
        }
        let info = state
            .metadata
            .get_mut(identifier)
            .ok_or_else(|| Self::not_found(identifier))?;
        let current = info.status();
        if !current.can_refresh() {
            return Err(RegistryError::RefreshNotAllowed {
                identifier: identifier.to_owned(),
                status: current,
            });
        }
        info.insert_metadata("refreshed_at", Value::String(now.to_rfc3339()), now);
        state.entities.insert(identifier.to_owned(), Arc::new(entity));
        drop(guard);

        self.evict_content(identifier);
        info!(kind = %E::KIND, id = identifier, "refreshed entity");
        Ok(())
    }

    /// Marks the registry as running and records the start time.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyRunning`] when already running.
    pub fn start(&self) -> RegistryResult<()> {
        let now = self.clock.utc();
        let mut guard = self.write_state();
        if guard.running {
            return Err(RegistryError::AlreadyRunning(E::KIND));
        }
        guard.running = true;
        guard.started_at = Some(now);
        let registered = guard.factories.len();
        drop(guard);

        info!(kind = %E::KIND, registered, "registry started");
        Ok(())
    }

    /// Stops the registry: drops every live entity and cached content and
    /// moves every entry to `disabled`. Stopping a stopped registry does
    /// nothing.
    pub fn stop(&self) {
        let now = self.clock.utc();
        let mut guard = self.write_state();
        if !guard.running {
            return;
        }
        let state = &mut *guard;
        state.entities.clear();
        for info in state.metadata.values_mut() {
            if StatusStateMachine::is_valid_transition(info.status(), Status::Disabled) {
                info.set_status(Status::Disabled, now);
            }
        }
        state.running = false;
        drop(guard);

        self.clear_content();
        info!(kind = %E::KIND, "registry stopped");
    }

    async fn create_entity(
        &self,
        cancellation: &CancellationToken,
        identifier: &str,
    ) -> RegistryResult<(E, Breaker<E, C>)> {
        let (breaker, config) = {
            let guard = self.read_state();
            let breaker = guard
                .breakers
                .get(identifier)
                .cloned()
                .ok_or_else(|| Self::not_found(identifier))?;
            let config = guard.configs.get(identifier).cloned().unwrap_or_default();
            (breaker, config)
        };

        let ctx = CreationContext::new(
            identifier,
            cancellation.child_token(),
            self.config.creation_timeout(),
        );
        let entity = match breaker.create(&ctx, &config).await {
            Ok(entity) => entity,
            Err(CreationError::Cancelled) => {
                debug!(kind = %E::KIND, id = identifier, "creation cancelled");
                return Err(RegistryError::CreationFailed {
                    identifier: identifier.to_owned(),
                    source: CreationError::Cancelled,
                });
            }
            Err(source) => {
                warn!(kind = %E::KIND, id = identifier, error = %source, "creation failed");
                self.demote(identifier, &breaker, &source.to_string());
                return Err(RegistryError::CreationFailed {
                    identifier: identifier.to_owned(),
                    source,
                });
            }
        };

        if let Err(source) = self.validator.validate_entity(&entity) {
            warn!(kind = %E::KIND, id = identifier, error = %source, "created entity is invalid");
            self.demote(identifier, &breaker, &source.to_string());
            return Err(RegistryError::ValidationFailed {
                identifier: identifier.to_owned(),
                source,
            });
        }

        debug!(kind = %E::KIND, id = identifier, "created entity");
        Ok((entity, breaker))
    }

    fn retain(
        &self,
        identifier: &str,
        breaker: &Breaker<E, C>,
        entity: Arc<E>,
    ) -> RegistryResult<Arc<E>> {
        let now = self.clock.utc();
        let mut guard = self.write_state();
        let state = &mut *guard;
        if !state.is_registered_with(identifier, breaker) {
            return Err(Self::not_found(identifier));
        }
        if let Some(existing) = state.entities.get(identifier) {
            return Ok(Arc::clone(existing));
        }
        let info = state
            .metadata
            .get_mut(identifier)
            .ok_or_else(|| Self::not_found(identifier))?;

        let status = info.status();
        if status.holds_live_entity() {
            state
                .entities
                .insert(identifier.to_owned(), Arc::clone(&entity));
        } else if StatusStateMachine::is_valid_transition(status, Status::Loaded) {
            info.set_status(Status::Loaded, now);
            info.insert_metadata("loaded_at", Value::String(now.to_rfc3339()), now);
            state
                .entities
                .insert(identifier.to_owned(), Arc::clone(&entity));
        } else {
            debug!(
                kind = %E::KIND,
                id = identifier,
                %status,
                "entity handed out without retaining it"
            );
        }
        Ok(entity)
    }

    fn demote(&self, identifier: &str, breaker: &Breaker<E, C>, message: &str) {
        let now = self.clock.utc();
        let mut guard = self.write_state();
        let state = &mut *guard;
        if !state.is_registered_with(identifier, breaker) {
            return;
        }
        let Some(info) = state.metadata.get_mut(identifier) else {
            return;
        };
        if !StatusStateMachine::is_valid_transition(info.status(), Status::Error) {
            return;
        }
        info.mark_error(message, now);
        state.entities.remove(identifier);
        drop(guard);

        self.evict_content(identifier);
        warn!(kind = %E::KIND, id = identifier, reason = message, "entity moved to error");
    }

    fn not_found(identifier: &str) -> RegistryError {
        RegistryError::NotFound {
            kind: E::KIND,
            identifier: identifier.to_owned(),
        }
    }

    // Every write below is a single map operation, so a poisoned lock still
    // guards consistent state.
    fn read_state(&self) -> RwLockReadGuard<'_, RegistryState<E, C>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RegistryState<E, C>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, HashMap<String, CachedContent>> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, HashMap<String, CachedContent>> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn evict_content(&self, identifier: &str) {
        self.write_cache().remove(identifier);
    }

    fn clear_content(&self) {
        self.write_cache().clear();
    }
}
