//! Per-request authentication, pull and streaming of resolved assets.

use std::path::PathBuf;
use std::sync::Arc;

use artigate_core::Asset;
use artigate_registry::{read_credential, ArtifactPuller, Credential, PulledArtifact, Session};
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::{GatewayError, Result};

/// Authenticates and pulls assets from their own registry.
///
/// Credentials are read and a login is performed on every call; concurrent
/// requests for the same asset each do their own pull.
#[derive(Clone)]
pub struct PullProxy {
    puller: Arc<dyn ArtifactPuller>,
    credential_path: PathBuf,
}

impl PullProxy {
    /// Creates a proxy reading credentials from `credential_path`.
    pub fn new(puller: Arc<dyn ArtifactPuller>, credential_path: impl Into<PathBuf>) -> Self {
        Self {
            puller,
            credential_path: credential_path.into(),
        }
    }

    /// Reads the backend credential.
    pub async fn acquire_credential(&self) -> Result<Credential> {
        read_credential(&self.credential_path)
            .await
            .map_err(GatewayError::CredentialUnavailable)
    }

    /// Logs in against the registry hosting `uri`.
    pub async fn authenticate(&self, uri: &str, credential: &Credential) -> Result<Session> {
        self.puller
            .login(uri, credential)
            .await
            .map_err(|source| GatewayError::AuthenticationFailed {
                uri: uri.to_string(),
                source,
            })
    }

    /// Pulls the artifact at `uri` with an established session.
    pub async fn pull(&self, session: &Session, uri: &str) -> Result<PulledArtifact> {
        self.puller
            .pull(session, uri)
            .await
            .map_err(|source| GatewayError::PullFailed {
                uri: uri.to_string(),
                source,
            })
    }

    /// Runs credential read, login and pull for one asset.
    pub async fn fetch(&self, asset: &Asset) -> Result<PulledArtifact> {
        let credential = self.acquire_credential().await?;
        let session = self.authenticate(&asset.uri, &credential).await?;
        self.pull(&session, &asset.uri).await
    }
}

/// Writes a pulled artifact as a complete attachment response.
pub fn stream(artifact: PulledArtifact) -> Response {
    let disposition = format!("attachment; filename={}", artifact.file_name());
    let Ok(disposition) = HeaderValue::from_str(&disposition) else {
        tracing::error!(file_name = %artifact.file_name(), "chart metadata is not a valid file name");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "chart metadata is not a valid file name",
        )
            .into_response();
    };

    (
        StatusCode::OK,
        [
            (header::CONTENT_DISPOSITION, disposition),
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
        ],
        Body::from(artifact.data),
    )
        .into_response()
}
