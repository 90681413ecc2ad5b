//! Resource entities: URI-addressed readable content.

use crate::registry::{
    domain::{EntityKind, ResourceContent},
    ports::{Entity, EntityError, EntityResult, ReadableEntity},
    services::Registry,
};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Registry of resource factories, keyed by URI.
pub type ResourceRegistry<C> = Registry<Resource, C>;

/// Produces the content behind a resource URI.
#[async_trait]
pub trait ResourceReader: Send + Sync {
    /// Reads the content at `uri`.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError`] when the content cannot be produced.
    async fn read(
        &self,
        uri: &str,
        cancellation: &CancellationToken,
    ) -> EntityResult<ResourceContent>;
}

/// A live resource instance.
#[derive(Clone)]
pub struct Resource {
    uri: String,
    name: String,
    description: String,
    mime_type: Option<String>,
    reader: Option<Arc<dyn ResourceReader>>,
}

impl fmt::Debug for Resource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Resource")
            .field("uri", &self.uri)
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("has_reader", &self.reader.is_some())
            .finish_non_exhaustive()
    }
}

impl Resource {
    /// Creates a resource without a reader.
    #[must_use]
    pub fn new(
        uri: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            description: description.into(),
            mime_type: None,
            reader: None,
        }
    }

    /// Sets the MIME type reported for content that carries none.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Attaches the reader that produces content.
    #[must_use]
    pub fn with_reader(mut self, reader: Arc<dyn ResourceReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Returns the resource URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns the default MIME type.
    #[must_use]
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }
}

impl Entity for Resource {
    const KIND: EntityKind = EntityKind::Resource;

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn has_handler(&self) -> bool {
        self.reader.is_some()
    }
}

#[async_trait]
impl ReadableEntity for Resource {
    async fn read(&self, cancellation: &CancellationToken) -> EntityResult<ResourceContent> {
        let reader = self
            .reader
            .as_ref()
            .ok_or_else(|| EntityError::MissingHandler(self.uri.clone()))?;
        let content = reader.read(&self.uri, cancellation).await?;
        match (&self.mime_type, content.mime_type()) {
            (Some(mime_type), None) => Ok(content.with_mime_type(mime_type.clone())),
            _ => Ok(content),
        }
    }
}
