//! Validation of identifiers, factories, live entities, and configuration.
//!
//! Rules are pure functions in [`rules`] that append to a shared
//! [`ValidationErrors`] collector; [`EntityValidator`] composes them so a
//! single call reports every violated rule.

mod error;
pub mod rules;
mod service;

pub use error::{ValidationErrors, ValidationResult, Violation};
pub use service::{EntityValidator, ValidatorLimits};
