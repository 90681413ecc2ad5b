//! Entity kinds served by a registry instance.

use super::ParseEntityKindError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of capability a registry manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Callable tools, identified by tool name.
    Tool,
    /// Readable resources, identified by URI.
    Resource,
}

impl EntityKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::Resource => "resource",
        }
    }

    /// Returns whether identifiers of this kind are URIs.
    #[must_use]
    pub const fn uses_uri_identifiers(self) -> bool {
        matches!(self, Self::Resource)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EntityKind {
    type Error = ParseEntityKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "tool" => Ok(Self::Tool),
            "resource" => Ok(Self::Resource),
            _ => Err(ParseEntityKindError(value.to_owned())),
        }
    }
}
