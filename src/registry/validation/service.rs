//! Composite validator used by the registry.

use super::{ValidationErrors, ValidationResult, rules};
use crate::registry::{
    domain::{EntityKind, FactoryDescriptor, RegistryConfig},
    ports::{Entity, Factory},
};

/// Length limits and allowed URI schemes applied by [`EntityValidator`].
///
/// # Examples
///
/// ```
/// use capability_registry::registry::validation::ValidatorLimits;
///
/// let limits = ValidatorLimits::default();
/// assert_eq!(limits.max_identifier_length, 2048);
/// assert!(limits.allowed_schemes.iter().any(|scheme| scheme == "file"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorLimits {
    /// Maximum identifier length in characters.
    pub max_identifier_length: usize,
    /// Maximum display name length in characters.
    pub max_name_length: usize,
    /// Maximum description length in characters.
    pub max_description_length: usize,
    /// Maximum version length in characters.
    pub max_version_length: usize,
    /// Maximum number of tags.
    pub max_tags: usize,
    /// Maximum tag and capability length in characters.
    pub max_tag_length: usize,
    /// URI schemes accepted for resource identifiers.
    pub allowed_schemes: Vec<String>,
}

impl Default for ValidatorLimits {
    fn default() -> Self {
        Self {
            max_identifier_length: 2_048,
            max_name_length: 128,
            max_description_length: 4_096,
            max_version_length: 64,
            max_tags: 32,
            max_tag_length: 64,
            allowed_schemes: ["file", "http", "https", "resource"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }
}

impl ValidatorLimits {
    /// Adds an accepted URI scheme.
    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.allowed_schemes.push(scheme.into().to_ascii_lowercase());
        self
    }
}

/// Validates identifiers, factories, live entities, and configuration.
///
/// Every method checks all of its rules and returns the full set of
/// violations rather than the first one.
///
/// # Examples
///
/// ```
/// use capability_registry::registry::domain::{EntityKind, FactoryDescriptor};
/// use capability_registry::registry::validation::EntityValidator;
///
/// let validator = EntityValidator::new();
/// let descriptor = FactoryDescriptor::new("", "", "", "");
/// let errors = validator
///     .validate_descriptor(EntityKind::Tool, &descriptor)
///     .expect_err("blank descriptor is invalid");
/// assert!(errors.has_errors());
/// assert!(errors.len() >= 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EntityValidator {
    limits: ValidatorLimits,
}

impl EntityValidator {
    /// Creates a validator with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a validator with custom limits.
    #[must_use]
    pub const fn with_limits(limits: ValidatorLimits) -> Self {
        Self { limits }
    }

    /// Returns the active limits.
    #[must_use]
    pub const fn limits(&self) -> &ValidatorLimits {
        &self.limits
    }

    /// Validates an identifier for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`super::ValidationErrors`] listing each violated rule.
    pub fn validate_identifier(&self, kind: EntityKind, identifier: &str) -> ValidationResult<()> {
        let mut errors = ValidationErrors::new();
        rules::check_identifier(&mut errors, kind, identifier, &self.limits);
        errors.into_result()
    }

    /// Validates a display name.
    ///
    /// # Errors
    ///
    /// Returns [`super::ValidationErrors`] listing each violated rule.
    pub fn validate_name(&self, name: &str) -> ValidationResult<()> {
        let mut errors = ValidationErrors::new();
        rules::check_name(&mut errors, name, &self.limits);
        errors.into_result()
    }

    /// Validates every field of a factory descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`super::ValidationErrors`] listing each violated rule.
    pub fn validate_descriptor(
        &self,
        kind: EntityKind,
        descriptor: &FactoryDescriptor,
    ) -> ValidationResult<()> {
        let mut errors = ValidationErrors::new();
        rules::check_identifier(&mut errors, kind, descriptor.identifier(), &self.limits);
        rules::check_name(&mut errors, descriptor.name(), &self.limits);
        rules::check_description(&mut errors, descriptor.description(), &self.limits);
        rules::check_version(&mut errors, descriptor.version(), &self.limits);
        rules::check_capabilities(&mut errors, descriptor.capabilities(), &self.limits);
        rules::check_tags(&mut errors, descriptor.tags(), &self.limits);
        errors.into_result()
    }

    /// Validates a factory's descriptor for its entity kind.
    ///
    /// # Errors
    ///
    /// Returns [`super::ValidationErrors`] listing each violated rule.
    pub fn validate_factory<E: Entity>(&self, factory: &dyn Factory<E>) -> ValidationResult<()> {
        self.validate_descriptor(E::KIND, factory.descriptor())
    }

    /// Validates a live entity.
    ///
    /// # Errors
    ///
    /// Returns [`super::ValidationErrors`] when the handler is missing or the
    /// name or description is blank.
    pub fn validate_entity<E: Entity>(&self, entity: &E) -> ValidationResult<()> {
        let mut errors = ValidationErrors::new();
        if !entity.has_handler() {
            errors.push("handler", entity.name(), "entity must have a handler");
        }
        if entity.name().trim().is_empty() {
            errors.push("name", entity.name(), "must not be empty");
        }
        if entity.description().trim().is_empty() {
            errors.push("description", entity.description(), "must not be empty");
        }
        errors.into_result()
    }

    /// Validates registry and breaker configuration bounds.
    ///
    /// # Errors
    ///
    /// Returns [`super::ValidationErrors`] listing each out-of-range field.
    pub fn validate_config(&self, config: &RegistryConfig) -> ValidationResult<()> {
        let mut errors = ValidationErrors::new();
        rules::check_registry_config(&mut errors, config);
        errors.into_result()
    }
}
