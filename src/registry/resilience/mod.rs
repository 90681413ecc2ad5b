//! Failure isolation for factory creation calls.
//!
//! [`CircuitBreaker`] is a failure-ratio breaker driven by an injected clock;
//! [`CircuitBreakerFactory`] binds one breaker to one registered factory.

mod circuit_breaker;
mod factory;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerError, CircuitState, Counts};
pub use factory::{CircuitBreakerFactory, CreationError};
