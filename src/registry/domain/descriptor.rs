//! Static description of a capability factory.

use serde::{Deserialize, Serialize};

/// Descriptor published by a factory before any entity exists.
///
/// The descriptor is not validated on construction; the registry runs it
/// through [`crate::registry::validation::EntityValidator::validate_factory`]
/// at registration so every violation is reported together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryDescriptor {
    identifier: String,
    name: String,
    description: String,
    version: String,
    tags: Vec<String>,
    capabilities: Vec<String>,
}

impl FactoryDescriptor {
    /// Creates a descriptor with no tags or capabilities.
    #[must_use]
    pub fn new(
        identifier: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            description: description.into(),
            version: version.into(),
            tags: Vec::new(),
            capabilities: Vec::new(),
        }
    }

    /// Sets the descriptor tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the advertised capabilities.
    #[must_use]
    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the tool name or resource URI.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the advertised capabilities.
    #[must_use]
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }
}
