//! Unit tests for the capability registry.
//!
//! Tests are organised by component: status machine, validation, circuit
//! breaking, the registry lifecycle, and the content cache.

mod registry_tests;
mod support;
