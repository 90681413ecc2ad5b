//! Lifecycle statuses and the fixed transition table between them.

use super::ParseStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a registered capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Status has not been established.
    Unknown,
    /// The factory is registered but no entity has been created.
    Registered,
    /// An entity has been created and passed its creation-time checks.
    Loaded,
    /// A loaded entity passed a validation pass and is serving.
    Active,
    /// Creation, validation, or refresh failed.
    Error,
    /// The entry was switched off explicitly or by a registry stop.
    Disabled,
}

impl Status {
    /// Every status, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Unknown,
        Self::Registered,
        Self::Loaded,
        Self::Active,
        Self::Error,
        Self::Disabled,
    ];

    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Registered => "registered",
            Self::Loaded => "loaded",
            Self::Active => "active",
            Self::Error => "error",
            Self::Disabled => "disabled",
        }
    }

    /// Returns whether a live entity may be retained in this status.
    #[must_use]
    pub const fn holds_live_entity(self) -> bool {
        matches!(self, Self::Loaded | Self::Active)
    }

    /// Returns whether an entry in this status may be refreshed.
    #[must_use]
    pub const fn can_refresh(self) -> bool {
        self.holds_live_entity()
    }

    /// Returns whether entering this status purges the live entity and any
    /// cached content.
    #[must_use]
    pub const fn purges_on_entry(self) -> bool {
        matches!(self, Self::Error | Self::Disabled)
    }

    /// Returns whether entering this status requires a running registry.
    #[must_use]
    pub const fn requires_running_registry(self) -> bool {
        matches!(self, Self::Loaded | Self::Active)
    }

    /// Returns whether transition to `target` is allowed.
    ///
    /// Identity transitions are always allowed.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        if self as u8 == target as u8 {
            return true;
        }
        matches!(
            (self, target),
            (Self::Registered, Self::Loaded | Self::Error | Self::Disabled)
                | (Self::Loaded, Self::Active | Self::Error | Self::Disabled)
                | (Self::Active, Self::Error | Self::Disabled | Self::Loaded)
                | (Self::Error, Self::Registered | Self::Disabled)
                | (Self::Disabled, Self::Registered | Self::Error)
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Status {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, ParseStatusError> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "unknown" => Ok(Self::Unknown),
            "registered" => Ok(Self::Registered),
            "loaded" => Ok(Self::Loaded),
            "active" => Ok(Self::Active),
            "error" => Ok(Self::Error),
            "disabled" => Ok(Self::Disabled),
            _ => Err(ParseStatusError(value.to_owned())),
        }
    }
}

/// Stateless gate for every status mutation made by the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusStateMachine;

impl StatusStateMachine {
    /// Returns whether moving from `from` to `to` is permitted.
    #[must_use]
    pub const fn is_valid_transition(from: Status, to: Status) -> bool {
        from.can_transition_to(to)
    }

    /// Returns `from` followed by every status reachable from it in one step.
    #[must_use]
    pub fn allowed_transitions(from: Status) -> Vec<Status> {
        std::iter::once(from)
            .chain(
                Status::ALL
                    .into_iter()
                    .filter(|&target| target != from && from.can_transition_to(target)),
            )
            .collect()
    }
}
