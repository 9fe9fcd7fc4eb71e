//! Paginated artifact listing consumed by the index build.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Boxed error returned by listing implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One item of a backend listing page.
///
/// Deserializes directly from an Artifact Registry `DockerImage` resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedArtifact {
    /// Fully qualified resource identifier (`.../dockerImages/{name}@{digest}`).
    pub name: String,

    /// Registry location of the artifact.
    #[serde(default)]
    pub uri: String,

    /// Content type of the artifact.
    #[serde(default)]
    pub media_type: String,

    /// Tags currently pointing at the artifact.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Upload time, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_time: Option<DateTime<Utc>>,
}

impl ListedArtifact {
    /// Creates a listing item with no tags and an empty media type.
    #[must_use]
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            media_type: String::new(),
            tags: Vec::new(),
            upload_time: None,
        }
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Sets the media type.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    /// Items on this page, in backend order.
    #[serde(default, alias = "dockerImages")]
    pub items: Vec<ListedArtifact>,

    /// Token for the next page; absent or empty on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl ListingPage {
    /// Returns the continuation token if another page follows.
    #[must_use]
    pub fn next_token(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Source of a full, paginated artifact listing for one repository.
#[async_trait]
pub trait AssetListing: Send + Sync {
    /// Fetches one page. `None` requests the first page.
    async fn list_page(&self, page_token: Option<&str>) -> Result<ListingPage, BoxError>;
}
