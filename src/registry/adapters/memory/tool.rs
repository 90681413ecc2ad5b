//! In-memory tool factory.

use super::FactoryBehaviour;
use crate::registry::{
    adapters::{Tool, ToolHandler},
    domain::FactoryDescriptor,
    ports::{CreationContext, EntityConfig, EntityResult, Factory, FactoryResult},
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Tool factory that clones a template tool on every creation.
#[derive(Debug)]
pub struct InMemoryToolFactory {
    descriptor: FactoryDescriptor,
    template: Tool,
    behaviour: FactoryBehaviour,
}

#[derive(Debug)]
struct EchoHandler;

#[async_trait]
impl ToolHandler for EchoHandler {
    async fn call(&self, arguments: Value) -> EntityResult<Value> {
        Ok(arguments)
    }
}

impl InMemoryToolFactory {
    /// Creates a factory that produces clones of `template`.
    #[must_use]
    pub fn new(descriptor: FactoryDescriptor, template: Tool) -> Self {
        Self {
            descriptor,
            template,
            behaviour: FactoryBehaviour::default(),
        }
    }

    /// Creates a factory for a tool named `name` that returns its arguments.
    #[must_use]
    pub fn echo(name: &str) -> Self {
        let descriptor = FactoryDescriptor::new(name, name, "Returns its arguments", "1.0.0")
            .with_capabilities(["tools"]);
        let template = Tool::new(name, "Returns its arguments").with_handler(Arc::new(EchoHandler));
        Self::new(descriptor, template)
    }

    /// Makes every creation wait for `delay` first.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.behaviour.delay = Some(delay);
        self
    }

    /// Requires `key` to be present in the factory configuration.
    #[must_use]
    pub fn with_required_key(mut self, key: impl Into<String>) -> Self {
        self.behaviour.required_keys.push(key.into());
        self
    }

    /// Returns how many times `create` has been invoked.
    #[must_use]
    pub fn creations(&self) -> usize {
        self.behaviour.creations()
    }

    /// Makes subsequent creations fail, or succeed again.
    pub fn set_failing(&self, failing: bool) {
        self.behaviour.set_failing(failing);
    }

    /// Makes configuration checks reject every configuration, or accept
    /// again.
    pub fn set_rejecting_config(&self, rejecting: bool) {
        self.behaviour.set_rejecting_config(rejecting);
    }
}

#[async_trait]
impl Factory<Tool> for InMemoryToolFactory {
    fn descriptor(&self) -> &FactoryDescriptor {
        &self.descriptor
    }

    async fn create(&self, ctx: &CreationContext, _config: &EntityConfig) -> FactoryResult<Tool> {
        self.behaviour.before_create(ctx).await?;
        Ok(self.template.clone())
    }

    fn validate(&self, config: &EntityConfig) -> FactoryResult<()> {
        self.behaviour.validate(config)
    }
}
