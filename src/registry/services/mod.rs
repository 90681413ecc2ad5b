//! The generic capability registry.

mod error;
mod registry;

pub use error::{EntityFailure, RegistryError, RegistryResult};
pub use registry::Registry;
