//! Tool entities: named, schema-described callables.

use crate::registry::{
    domain::EntityKind,
    ports::{Entity, EntityError, EntityResult},
    services::Registry,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;

/// Registry of tool factories.
pub type ToolRegistry<C> = Registry<Tool, C>;

/// Executes a tool call.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Runs the tool with JSON `arguments`.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError`] when the arguments are rejected or the call
    /// fails.
    async fn call(&self, arguments: Value) -> EntityResult<Value>;
}

/// A live tool instance.
#[derive(Clone)]
pub struct Tool {
    name: String,
    description: String,
    input_schema: Value,
    handler: Option<Arc<dyn ToolHandler>>,
}

impl fmt::Debug for Tool {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl Tool {
    /// Creates a tool without a handler that accepts any JSON object.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: json!({ "type": "object" }),
            handler: None,
        }
    }

    /// Sets the JSON Schema describing the tool arguments.
    #[must_use]
    pub fn with_input_schema(mut self, input_schema: Value) -> Self {
        self.input_schema = input_schema;
        self
    }

    /// Attaches the handler that executes calls.
    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Returns the JSON Schema describing the tool arguments.
    #[must_use]
    pub const fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    /// Invokes the tool.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::MissingHandler`] when no handler is attached,
    /// [`EntityError::InvalidArguments`] when `arguments` is neither an object
    /// nor null, and any error raised by the handler.
    pub async fn call(&self, arguments: Value) -> EntityResult<Value> {
        let handler = self
            .handler
            .as_ref()
            .ok_or_else(|| EntityError::MissingHandler(self.name.clone()))?;
        let arguments = match arguments {
            Value::Null => Value::Object(serde_json::Map::new()),
            Value::Object(_) => arguments,
            other => {
                return Err(EntityError::InvalidArguments(format!(
                    "expected a JSON object, got {other}"
                )));
            }
        };
        handler.call(arguments).await
    }
}

impl Entity for Tool {
    const KIND: EntityKind = EntityKind::Tool;

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn has_handler(&self) -> bool {
        self.handler.is_some()
    }
}
