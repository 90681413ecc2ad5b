//! Concrete entity kinds and in-memory factories.

pub mod memory;
mod resource;
mod tool;

pub use memory::{InMemoryResourceFactory, InMemoryToolFactory};
pub use resource::{Resource, ResourceReader, ResourceRegistry};
pub use tool::{Tool, ToolHandler, ToolRegistry};
