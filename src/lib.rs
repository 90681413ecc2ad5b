//! Capability registry: plugin lifecycle for MCP tools and resources.
//!
//! This crate keeps factories for tools and resources, instantiates them on
//! first use behind a per-factory circuit breaker, validates what they
//! produce, and reports registry health.
//!
//! # Architecture
//!
//! The registry follows hexagonal architecture principles:
//!
//! - **Domain**: Status machine, metadata, configuration, and health types
//! - **Ports**: The entity and factory contracts capabilities implement
//! - **Adapters**: Tool and resource entities plus in-memory factories
//! - **Services**: The generic lifecycle registry
//!
//! # Modules
//!
//! - [`registry`]: Registration, lifecycle, validation, and circuit breaking
//! - [`telemetry`]: Tracing subscriber setup

pub mod registry;
pub mod telemetry;
