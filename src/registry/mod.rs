//! Plugin lifecycle core shared by the tool and resource registries.
//!
//! Capability factories are registered under an identifier, instantiated on
//! demand behind a per-identifier circuit breaker, validated, health-checked,
//! and torn down without letting one failing capability affect the others.
//! The module follows the same hexagonal split as the rest of the crate:
//!
//! - Domain types in [`domain`]
//! - Capability contracts in [`ports`]
//! - Validation rules in [`validation`]
//! - Circuit breaking in [`resilience`]
//! - The generic [`services::Registry`] in [`services`]
//! - Tool and resource entity kinds plus in-memory factories in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod resilience;
pub mod services;
pub mod validation;

#[cfg(test)]
mod tests;
