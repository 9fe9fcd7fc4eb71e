//! Error types for registry operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Failed to connect to registry.
    #[error("Failed to connect to registry at {url}: {source}")]
    ConnectionFailed {
        /// Registry URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// Authentication failed.
    #[error("Authentication failed for {registry}: {message}")]
    AuthenticationFailed {
        /// Registry host.
        registry: String,
        /// Error message.
        message: String,
    },

    /// Manifest or blob not found in registry.
    #[error("Not found in registry: {reference}")]
    NotFound {
        /// Reference that was requested.
        reference: String,
    },

    /// The artifact is not a packaged chart.
    #[error("Unsupported artifact {reference}: {message}")]
    UnsupportedArtifact {
        /// Artifact reference.
        reference: String,
        /// Error message.
        message: String,
    },

    /// Digest mismatch during download.
    #[error("Digest mismatch for {reference}: expected {expected}, got {actual}")]
    DigestMismatch {
        /// Artifact reference.
        reference: String,
        /// Expected digest.
        expected: String,
        /// Actual digest.
        actual: String,
    },

    /// Credential file could not be read.
    #[error("Failed to read credential at {path}: {source}")]
    CredentialUnavailable {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// HTTP error from registry.
    #[error("HTTP error from registry: {status} - {message}")]
    HttpError {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {source}")]
    JsonError {
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Invalid URL.
    #[error("Invalid URL: {url}")]
    InvalidUrl {
        /// URL string.
        url: String,
    },

    /// Invalid reference format.
    #[error("Invalid reference format: {reference}")]
    InvalidReference {
        /// Reference string.
        reference: String,
    },

    /// Client misconfiguration (TLS material, auth mode).
    #[error("Invalid registry configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::ConnectionFailed {
                url: err
                    .url()
                    .map_or_else(|| "unknown".to_string(), ToString::to_string),
                source: err,
            }
        } else if err.is_status() {
            let status = err.status().map_or(0, |s| s.as_u16());
            Self::HttpError {
                status,
                message: err.to_string(),
            }
        } else {
            Self::HttpError {
                status: 0,
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError { source: err }
    }
}
