//! Parse errors for registry domain values.

use thiserror::Error;

/// Error returned while parsing a lifecycle status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown entity status: {0}")]
pub struct ParseStatusError(pub String);

/// Error returned while parsing an entity kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown entity kind: {0}")]
pub struct ParseEntityKindError(pub String);

/// Error returned while parsing an overall health status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown registry health status: {0}")]
pub struct ParseHealthStatusError(pub String);
