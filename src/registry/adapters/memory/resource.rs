//! In-memory resource factory backed by mutable text.

use super::FactoryBehaviour;
use crate::registry::{
    adapters::{Resource, ResourceReader},
    domain::{FactoryDescriptor, ResourceContent},
    ports::{CreationContext, EntityConfig, EntityResult, Factory, FactoryResult},
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Resource factory whose resources serve text held by the factory.
///
/// Every created resource shares one reader, so [`Self::set_text`] changes
/// what subsequent reads return and [`Self::reads`] counts reads across all
/// instances.
#[derive(Debug)]
pub struct InMemoryResourceFactory {
    descriptor: FactoryDescriptor,
    mime_type: Option<String>,
    reader: Arc<TextReader>,
    behaviour: FactoryBehaviour,
}

#[derive(Debug, Default)]
struct TextReader {
    text: RwLock<String>,
    reads: AtomicUsize,
    delay: Option<Duration>,
}

#[async_trait]
impl ResourceReader for TextReader {
    async fn read(
        &self,
        uri: &str,
        cancellation: &CancellationToken,
    ) -> EntityResult<ResourceContent> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::select! {
                () = cancellation.cancelled() => {}
                () = tokio::time::sleep(delay) => {}
            }
        }
        let text = self
            .text
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Ok(ResourceContent::text(uri, text))
    }
}

impl InMemoryResourceFactory {
    /// Creates a factory for `uri` serving `text` as `text/plain`, named
    /// after the last path segment of the URI.
    #[must_use]
    pub fn text(uri: &str, text: impl Into<String>) -> Self {
        let name = uri
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or("resource");
        let descriptor = FactoryDescriptor::new(uri, name, "In-memory text resource", "1.0.0")
            .with_capabilities(["resources"]);
        Self::new(descriptor, text).with_mime_type("text/plain")
    }

    /// Creates a factory with a custom descriptor serving `text`.
    #[must_use]
    pub fn new(descriptor: FactoryDescriptor, text: impl Into<String>) -> Self {
        Self {
            descriptor,
            mime_type: None,
            reader: Arc::new(TextReader {
                text: RwLock::new(text.into()),
                ..TextReader::default()
            }),
            behaviour: FactoryBehaviour::default(),
        }
    }

    /// Sets the MIME type of created resources.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Makes every creation wait for `delay` first.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.behaviour.delay = Some(delay);
        self
    }

    /// Makes every read wait for `delay` first.
    ///
    /// Call before sharing the factory; the reader is rebuilt with the
    /// current text.
    #[must_use]
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        let text = self
            .reader
            .text
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        self.reader = Arc::new(TextReader {
            text: RwLock::new(text),
            reads: AtomicUsize::new(0),
            delay: Some(delay),
        });
        self
    }

    /// Replaces the text served by subsequent reads.
    pub fn set_text(&self, text: impl Into<String>) {
        *self
            .reader
            .text
            .write()
            .unwrap_or_else(PoisonError::into_inner) = text.into();
    }

    /// Returns how many reads have reached the reader.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reader.reads.load(Ordering::SeqCst)
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
}

#[async_trait]
impl Factory<Resource> for InMemoryResourceFactory {
    fn descriptor(&self) -> &FactoryDescriptor {
        &self.descriptor
    }

    async fn create(
        &self,
        ctx: &CreationContext,
        _config: &EntityConfig,
    ) -> FactoryResult<Resource> {
        self.behaviour.before_create(ctx).await?;
        let resource = Resource::new(
            self.descriptor.identifier(),
            self.descriptor.name(),
            self.descriptor.description(),
        )
        .with_reader(Arc::clone(&self.reader) as Arc<dyn ResourceReader>);
        Ok(match &self.mime_type {
            Some(mime_type) => resource.with_mime_type(mime_type.clone()),
            None => resource,
        })
    }

    fn validate(&self, config: &EntityConfig) -> FactoryResult<()> {
        self.behaviour.validate(config)
    }
}
