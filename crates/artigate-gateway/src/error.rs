//! Error types for the gateway crate.
//!
//! Per-request errors become HTTP responses through [`IntoResponse`]; none of
//! them terminate the process. Startup errors are returned from bootstrap.

use artigate_core::IndexError;
use artigate_registry::RegistryError;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors that can occur while serving or bootstrapping a gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Requested asset is not indexed.
    #[error("asset not found: {reference}")]
    NotFound {
        /// The reference as requested.
        reference: String,
    },

    /// Request path could not be understood.
    #[error("bad request: {reason}")]
    BadRequest {
        /// Why the request was rejected.
        reason: String,
    },

    /// Caller is not on the allow-list.
    #[error("unauthorized")]
    Unauthorized,

    /// Backend credential file could not be read.
    #[error("credential unavailable: {0}")]
    CredentialUnavailable(#[source] RegistryError),

    /// Login against the asset's registry failed.
    #[error("authentication against {uri} failed: {source}")]
    AuthenticationFailed {
        /// Registry location of the asset.
        uri: String,
        /// Underlying error.
        #[source]
        source: RegistryError,
    },

    /// Asset is indexed but the backend fetch failed.
    #[error("failed to pull {uri}: {source}")]
    PullFailed {
        /// Registry location of the asset.
        uri: String,
        /// Underlying error.
        #[source]
        source: RegistryError,
    },

    /// Backend metadata lookup failed.
    #[error("backend error: {0}")]
    Backend(#[source] RegistryError),

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Reason for invalidity.
        reason: String,
    },

    /// Index could not be built.
    #[error("index build failed: {0}")]
    Index(#[from] IndexError),

    /// IO error (listener bind, serve).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::CredentialUnavailable(_)
            | Self::AuthenticationFailed { .. }
            | Self::PullFailed { .. }
            | Self::Backend(_)
            | Self::InvalidConfig { .. }
            | Self::Index(_)
            | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::info!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = self.to_string();
        if matches!(self, Self::Unauthorized) {
            return (
                status,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"artigate\"")],
                body,
            )
                .into_response();
        }
        (status, body).into_response()
    }
}
