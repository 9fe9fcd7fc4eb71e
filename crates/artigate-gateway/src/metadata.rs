//! Index-free pass-through of image metadata lookups.

use std::sync::Arc;

use artigate_core::RepositoryPath;
use artigate_registry::ImageMetadata;
use axum::extract::State;
use axum::http::{header, HeaderMap, Uri};
use axum::routing::get;
use axum::{Json, Router};
use base64::Engine as _;

use crate::config::{AuthPair, GatewayConfig};
use crate::error::{GatewayError, Result};
use crate::router::raw_segment;
use crate::server::ResolutionStrategy;

/// Basic-auth allow-list for the metadata gateway.
#[derive(Debug, Clone, Default)]
pub struct AuthPolicy {
    enforce: bool,
    pairs: Vec<AuthPair>,
}

impl AuthPolicy {
    /// Allow-list that is configured but not checked.
    pub fn permissive(pairs: Vec<AuthPair>) -> Self {
        Self {
            enforce: false,
            pairs,
        }
    }

    /// Allow-list that every request must match.
    pub fn enforcing(pairs: Vec<AuthPair>) -> Self {
        Self {
            enforce: true,
            pairs,
        }
    }

    /// Checks the request's `Authorization` header.
    pub fn check(&self, headers: &HeaderMap) -> Result<()> {
        if !self.enforce {
            return Ok(());
        }

        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Basic "))
            .and_then(|b64| base64::engine::general_purpose::STANDARD.decode(b64.trim()).ok())
            .and_then(|raw| String::from_utf8(raw).ok())
            .ok_or(GatewayError::Unauthorized)?;

        let (principal, secret) = presented.split_once(':').ok_or(GatewayError::Unauthorized)?;
        if self
            .pairs
            .iter()
            .any(|pair| pair.principal == principal && pair.secret == secret)
        {
            Ok(())
        } else {
            tracing::info!(principal = %principal, "rejected metadata request");
            Err(GatewayError::Unauthorized)
        }
    }
}

/// Resolution strategy that forwards the path to the backend metadata API.
#[derive(Clone)]
pub struct MetadataStrategy {
    metadata: Arc<dyn ImageMetadata>,
    repository: RepositoryPath,
    auth: AuthPolicy,
}

impl MetadataStrategy {
    /// Creates a strategy for `repository`.
    pub fn new(metadata: Arc<dyn ImageMetadata>, repository: RepositoryPath, auth: AuthPolicy) -> Self {
        Self {
            metadata,
            repository,
            auth,
        }
    }

    /// Creates a strategy from gateway configuration.
    pub fn from_config(metadata: Arc<dyn ImageMetadata>, config: &GatewayConfig) -> Self {
        let auth = if config.enforce_auths {
            AuthPolicy::enforcing(config.auths.clone())
        } else {
            AuthPolicy::permissive(config.auths.clone())
        };
        Self::new(metadata, config.repository_path(), auth)
    }

    /// Fetches the metadata document for one path segment.
    pub async fn describe(&self, asset: &str) -> Result<serde_json::Value> {
        reject_favicon(asset)?;

        let resource = self.repository.image_resource(asset);
        tracing::info!(asset = %asset, resource = %resource, "fetching image metadata");
        self.metadata
            .get_image(&resource)
            .await
            .map_err(GatewayError::Backend)
    }
}

impl ResolutionStrategy for MetadataStrategy {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn routes(self) -> Router {
        Router::new()
            .route("/:asset", get(describe_asset))
            .with_state(self)
    }
}

/// Favicon requests are answered before auth or any backend call.
fn reject_favicon(asset: &str) -> Result<()> {
    if asset.ends_with(".ico") {
        return Err(GatewayError::NotFound {
            reference: asset.to_string(),
        });
    }
    Ok(())
}

async fn describe_asset(
    State(strategy): State<MetadataStrategy>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    let asset = raw_segment(&uri);
    reject_favicon(asset)?;
    strategy.auth.check(&headers)?;
    strategy.describe(asset).await.map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn pairs() -> Vec<AuthPair> {
        vec!["alice:pw".parse().unwrap()]
    }

    fn basic(user_pass: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let encoded = base64::engine::general_purpose::STANDARD.encode(user_pass);
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {encoded}")).unwrap(),
        );
        headers
    }

    #[test]
    fn test_permissive_allows_anything() {
        let policy = AuthPolicy::permissive(pairs());
        assert!(policy.check(&HeaderMap::new()).is_ok());
    }

    #[test]
    fn test_enforcing_accepts_listed_pair() {
        let policy = AuthPolicy::enforcing(pairs());
        assert!(policy.check(&basic("alice:pw")).is_ok());
    }

    #[test]
    fn test_enforcing_rejects() {
        let policy = AuthPolicy::enforcing(pairs());
        assert!(matches!(policy.check(&HeaderMap::new()), Err(GatewayError::Unauthorized)));
        assert!(matches!(policy.check(&basic("alice:nope")), Err(GatewayError::Unauthorized)));
        assert!(matches!(policy.check(&basic("alice")), Err(GatewayError::Unauthorized)));
    }
}
