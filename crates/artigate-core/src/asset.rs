//! Asset model and repository coordinates.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One artifact recorded in the index.
///
/// Field names on the wire follow the gateway's original JSON document
/// shape (`sha`, `raw_name`, `media_type`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Short artifact identifier, e.g. `web`.
    pub name: String,

    /// Content digest, e.g. `sha256:9f86d0...`.
    #[serde(rename = "sha")]
    pub digest: String,

    /// Fully qualified backend resource identifier this entry was parsed from.
    pub raw_name: String,

    /// Registry location used for login and pull.
    pub uri: String,

    /// Artifact content type.
    pub media_type: String,

    /// Mutable aliases recorded at build time, in listing order.
    pub tags: Vec<String>,

    /// Upload time reported by the listing, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_time: Option<DateTime<Utc>>,
}

impl Asset {
    /// Returns true if `tag` is one of this asset's recorded aliases.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Backend coordinate of one artifact repository.
///
/// # Examples
///
/// ```
/// use artigate_core::RepositoryPath;
///
/// let path = RepositoryPath::new("acme", "us-central1", "charts");
/// assert_eq!(
///     path.to_string(),
///     "projects/acme/locations/us-central1/repositories/charts"
/// );
/// assert_eq!(
///     path.image_resource("web@sha256:1"),
///     "projects/acme/locations/us-central1/repositories/charts/dockerImages/web@sha256:1"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryPath {
    /// Project identifier.
    pub project: String,
    /// Region or multi-region location.
    pub location: String,
    /// Repository identifier.
    pub repository: String,
}

impl RepositoryPath {
    /// Creates a new repository coordinate.
    #[must_use]
    pub fn new(
        project: impl Into<String>,
        location: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            location: location.into(),
            repository: repository.into(),
        }
    }

    /// Resource path of a single image below this repository.
    #[must_use]
    pub fn image_resource(&self, image: &str) -> String {
        format!("{self}/dockerImages/{image}")
    }
}

impl fmt::Display for RepositoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/locations/{}/repositories/{}",
            self.project, self.location, self.repository
        )
    }
}
