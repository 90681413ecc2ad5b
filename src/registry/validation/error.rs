//! Compound validation error.

use thiserror::Error;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationErrors>;

/// One violated rule.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message} (value: '{value}')")]
pub struct Violation {
    field: String,
    value: String,
    message: String,
}

impl Violation {
    /// Creates a violation for `field`.
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// Returns the offending field.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the offending value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the rule message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Every violation found by one validation call.
///
/// Validation does not stop at the first failure; callers receive the
/// complete list in one round trip.
#[derive(Debug, Clone, Default, Error, PartialEq, Eq)]
#[error("validation failed: {}", format_violations(.violations))]
pub struct ValidationErrors {
    violations: Vec<Violation>,
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// Creates an empty collector.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    /// Records a violation.
    pub fn push(
        &mut self,
        field: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.violations.push(Violation::new(field, value, message));
    }

    /// Moves every violation of `other` into this collector.
    pub fn absorb(&mut self, other: Self) {
        self.violations.extend(other.violations);
    }

    /// Returns whether any violation was recorded.
    #[must_use]
    pub const fn has_errors(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Returns the recorded violations.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Returns the number of recorded violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns whether no violation was recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns whether a violation was recorded for `field`.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.violations
            .iter()
            .any(|violation| violation.field == field)
    }

    /// Converts the collector into a result.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one violation was recorded.
    pub fn into_result(self) -> ValidationResult<()> {
        if self.has_errors() {
            Err(self)
        } else {
            Ok(())
        }
    }
}
