//! Registry error taxonomy.

use crate::registry::{
    domain::{EntityKind, Status},
    ports::EntityError,
    resilience::CreationError,
    validation::ValidationErrors,
};
use thiserror::Error;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors returned by [`super::Registry`] operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No entry exists for the identifier.
    #[error("{kind} '{identifier}' not found")]
    NotFound {
        /// Registry entity kind.
        kind: EntityKind,
        /// Requested identifier.
        identifier: String,
    },

    /// An entry already exists for the identifier.
    #[error("{kind} '{identifier}' is already registered")]
    AlreadyExists {
        /// Registry entity kind.
        kind: EntityKind,
        /// Conflicting identifier.
        identifier: String,
    },

    /// The identifier is malformed.
    #[error("invalid identifier '{identifier}': {source}")]
    InvalidIdentifier {
        /// Rejected identifier.
        identifier: String,
        /// Every violated identifier rule.
        source: ValidationErrors,
    },

    /// A factory descriptor, factory configuration, or live entity failed
    /// validation.
    #[error("validation failed for '{identifier}': {source}")]
    ValidationFailed {
        /// Identifier under validation.
        identifier: String,
        /// Every violated rule.
        source: ValidationErrors,
    },

    /// The registry configuration is out of bounds.
    #[error("invalid registry configuration: {0}")]
    InvalidConfig(ValidationErrors),

    /// The factory produced no entity.
    #[error("failed to create '{identifier}': {source}")]
    CreationFailed {
        /// Identifier being instantiated.
        identifier: String,
        /// Underlying cause, including circuit rejection.
        source: CreationError,
    },

    /// The status transition is not in the transition table.
    #[error("invalid status transition for '{identifier}': {from} -> {to}")]
    InvalidTransition {
        /// Identifier whose status was to change.
        identifier: String,
        /// Current status.
        from: Status,
        /// Requested status.
        to: Status,
    },

    /// The requested status needs a running registry.
    #[error("registry is not running; cannot move '{identifier}' to {target}")]
    RegistryNotRunning {
        /// Identifier whose status was to change.
        identifier: String,
        /// Requested status.
        target: Status,
    },

    /// Refresh is only allowed from `loaded` or `active`.
    #[error("cannot refresh '{identifier}' in status {status}")]
    RefreshNotAllowed {
        /// Identifier to refresh.
        identifier: String,
        /// Current status.
        status: Status,
    },

    /// `start` was called on a running registry.
    #[error("{0} registry is already running")]
    AlreadyRunning(EntityKind),

    /// The caller cancelled a bulk operation or read.
    #[error("{operation} cancelled")]
    Cancelled {
        /// Cancelled operation name.
        operation: &'static str,
    },

    /// Reading entity content failed.
    #[error("failed to read '{identifier}': {source}")]
    ReadFailed {
        /// Identifier being read.
        identifier: String,
        /// Underlying entity failure.
        source: EntityError,
    },

    /// Some entries failed during a bulk pass; the rest were processed.
    #[error(
        "{operation} failed for {} of {attempted} {kind} entries: {}",
        .failures.len(),
        format_failures(.failures)
    )]
    BulkOperationFailed {
        /// Registry entity kind.
        kind: EntityKind,
        /// Bulk operation name.
        operation: &'static str,
        /// Number of entries the pass attempted.
        attempted: usize,
        /// Per-identifier failures.
        failures: Vec<EntityFailure>,
    },
}

fn format_failures(failures: &[EntityFailure]) -> String {
    failures
        .iter()
        .map(|failure| failure.identifier.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl RegistryError {
    /// Returns the identifiers that failed in a bulk pass, or an empty list
    /// for any other error.
    #[must_use]
    pub fn failed_identifiers(&self) -> Vec<&str> {
        match self {
            Self::BulkOperationFailed { failures, .. } => failures
                .iter()
                .map(|failure| failure.identifier.as_str())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// One identifier's failure within a bulk pass.
#[derive(Debug, Error)]
#[error("{identifier}: {error}")]
pub struct EntityFailure {
    identifier: String,
    error: Box<RegistryError>,
}

impl EntityFailure {
    /// Creates a failure record.
    #[must_use]
    pub fn new(identifier: impl Into<String>, error: RegistryError) -> Self {
        Self {
            identifier: identifier.into(),
            error: Box::new(error),
        }
    }

    /// Returns the failed identifier.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the failure cause.
    #[must_use]
    pub fn error(&self) -> &RegistryError {
        &self.error
    }
}
