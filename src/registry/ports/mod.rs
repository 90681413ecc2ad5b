//! Capability contracts consumed by the registry.
//!
//! External tool and resource implementations provide a [`Factory`] per
//! identifier; the registry never constructs entities itself.

mod context;
mod entity;
mod factory;

pub use context::{CreationContext, EntityConfig};
pub use entity::{Entity, EntityError, EntityResult, ReadableEntity};
pub use factory::{Factory, FactoryError, FactoryResult};
