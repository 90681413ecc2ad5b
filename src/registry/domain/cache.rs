//! Resource content payloads and their cache entries.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Body of a resource read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ContentBody {
    /// UTF-8 text content.
    Text(String),
    /// Binary content.
    Blob(Vec<u8>),
}

impl ContentBody {
    /// Returns the payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Blob(bytes) => bytes.len(),
        }
    }

    /// Returns whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Content produced by reading a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceContent {
    uri: String,
    mime_type: Option<String>,
    body: ContentBody,
}

impl ResourceContent {
    /// Creates resource content without a MIME type.
    #[must_use]
    pub fn new(uri: impl Into<String>, body: ContentBody) -> Self {
        Self {
            uri: uri.into(),
            mime_type: None,
            body,
        }
    }

    /// Creates text content.
    #[must_use]
    pub fn text(uri: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(uri, ContentBody::Text(text.into()))
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Returns the resource URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns the MIME type, if known.
    #[must_use]
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// Returns the content body.
    #[must_use]
    pub const fn body(&self) -> &ContentBody {
        &self.body
    }
}

/// Cache entry for previously read resource content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedContent {
    content: ResourceContent,
    cached_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    access_count: u64,
}

impl CachedContent {
    /// Creates a cache entry that expires `ttl` after `cached_at`.
    #[must_use]
    pub fn new(content: ResourceContent, cached_at: DateTime<Utc>, ttl: TimeDelta) -> Self {
        let expires_at = cached_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            content,
            cached_at,
            expires_at,
            access_count: 0,
        }
    }

    /// Returns the cached content.
    #[must_use]
    pub const fn content(&self) -> &ResourceContent {
        &self.content
    }

    /// Returns when the content was cached.
    #[must_use]
    pub const fn cached_at(&self) -> DateTime<Utc> {
        self.cached_at
    }

    /// Returns when the entry stops being served.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns how many times the entry has been served.
    #[must_use]
    pub const fn access_count(&self) -> u64 {
        self.access_count
    }

    /// Returns whether the entry has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Records one access and returns a copy of the content.
    pub fn record_access(&mut self) -> ResourceContent {
        self.access_count = self.access_count.saturating_add(1);
        self.content.clone()
    }
}
