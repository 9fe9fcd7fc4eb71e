//! OCI Distribution Specification types.
//!
//! This module defines the manifest and descriptor types needed to pull
//! Helm charts stored as OCI artifacts.

use serde::{Deserialize, Serialize};

/// OCI media type string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType(String);

impl MediaType {
    /// OCI image manifest media type.
    pub const OCI_MANIFEST: &'static str = "application/vnd.oci.image.manifest.v1+json";

    /// Docker v2 schema 2 manifest media type.
    pub const DOCKER_MANIFEST: &'static str =
        "application/vnd.docker.distribution.manifest.v2+json";

    /// Helm chart config media type.
    pub const HELM_CONFIG: &'static str = "application/vnd.cncf.helm.config.v1+json";

    /// Helm chart content layer media type.
    pub const HELM_CHART: &'static str = "application/vnd.cncf.helm.chart.content.v1.tar+gzip";

    /// Legacy chart layer media type written by early Helm 3 releases.
    pub const LEGACY_CHART: &'static str = "application/tar+gzip";

    /// Creates a new media type.
    #[must_use]
    pub fn new(media_type: impl Into<String>) -> Self {
        Self(media_type.into())
    }

    /// Returns the media type string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for chart content layers.
    #[must_use]
    pub fn is_chart_content(&self) -> bool {
        self.0 == Self::HELM_CHART || self.0 == Self::LEGACY_CHART
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MediaType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for MediaType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MediaType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self(s))
    }
}

/// OCI content descriptor.
///
/// A descriptor describes the disposition of targeted content. It includes
/// the type of the content, a content identifier (digest), and the byte-size
/// of the raw content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Media type of the referenced content.
    pub media_type: MediaType,

    /// Digest of the targeted content.
    pub digest: String,

    /// Size in bytes of the content.
    pub size: u64,

    /// Optional annotations (key-value metadata).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<std::collections::HashMap<String, String>>,
}

impl Descriptor {
    /// Creates a new descriptor.
    #[must_use]
    pub fn new(media_type: impl Into<MediaType>, digest: impl Into<String>, size: u64) -> Self {
        Self {
            media_type: media_type.into(),
            digest: digest.into(),
            size,
            annotations: None,
        }
    }

    /// Returns the digest algorithm (e.g., "sha256").
    #[must_use]
    pub fn digest_algorithm(&self) -> &str {
        self.digest.split(':').next().unwrap_or("sha256")
    }
}

/// OCI Image Manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Schema version (always 2).
    pub schema_version: u32,

    /// Media type of this manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,

    /// Configuration descriptor.
    pub config: Descriptor,

    /// Layers that make up the artifact.
    #[serde(default)]
    pub layers: Vec<Descriptor>,

    /// Optional annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<std::collections::HashMap<String, String>>,
}

impl Manifest {
    /// Returns true if the config blob is a Helm chart config.
    #[must_use]
    pub fn is_chart(&self) -> bool {
        self.config.media_type.as_str() == MediaType::HELM_CONFIG
    }

    /// Returns the chart content layer descriptor, if present.
    #[must_use]
    pub fn chart_layer(&self) -> Option<&Descriptor> {
        self.layers.iter().find(|d| d.media_type.is_chart_content())
    }
}

/// Chart metadata stored in the Helm config blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    /// Chart name.
    pub name: String,

    /// Chart version.
    pub version: String,

    /// Application version, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,

    /// Chart description, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Response of a registry token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl TokenResponse {
    pub(crate) fn into_token(self) -> Option<String> {
        self.token
            .filter(|t| !t.is_empty())
            .or_else(|| self.access_token.filter(|t| !t.is_empty()))
    }
}
