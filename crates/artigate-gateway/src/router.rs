//! Index-backed resolution of `{name}@{digest}` and `{name}:{tag}` requests.

use std::sync::Arc;

use artigate_core::{Asset, AssetIndex, AssetListing};
use axum::extract::State;
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use crate::error::{GatewayError, Result};
use crate::pull::{self, PullProxy};
use crate::server::ResolutionStrategy;

/// A parsed request reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// `{name}@{digest}`
    Digest {
        /// Asset name.
        name: String,
        /// Content digest.
        digest: String,
    },
    /// `{name}:{tag}`
    Tag {
        /// Asset name.
        name: String,
        /// Tag.
        tag: String,
    },
}

impl Resolution {
    /// Parses a request path segment.
    ///
    /// `@` takes precedence over `:` because digests contain a colon.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BadRequest`] for an empty name, digest or tag
    /// and [`GatewayError::NotFound`] when neither separator is present.
    pub fn parse(reference: &str) -> Result<Self> {
        let empty = |what: &str| GatewayError::BadRequest {
            reason: format!("empty {what} in '{reference}'"),
        };

        if let Some((name, digest)) = reference.split_once('@') {
            if name.is_empty() {
                return Err(empty("name"));
            }
            if digest.is_empty() {
                return Err(empty("digest"));
            }
            return Ok(Self::Digest {
                name: name.to_string(),
                digest: digest.to_string(),
            });
        }

        if let Some((name, tag)) = reference.split_once(':') {
            if name.is_empty() {
                return Err(empty("name"));
            }
            if tag.is_empty() {
                return Err(empty("tag"));
            }
            return Ok(Self::Tag {
                name: name.to_string(),
                tag: tag.to_string(),
            });
        }

        Err(GatewayError::NotFound {
            reference: reference.to_string(),
        })
    }
}

/// Resolution strategy backed by an immutable [`AssetIndex`].
#[derive(Clone)]
pub struct IndexStrategy {
    index: Arc<AssetIndex>,
    proxy: PullProxy,
}

impl IndexStrategy {
    /// Creates a strategy over an already built index.
    pub fn new(index: Arc<AssetIndex>, proxy: PullProxy) -> Self {
        Self { index, proxy }
    }

    /// Builds the index from `listing`, then creates the strategy.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Index`] if the listing fails or holds a
    /// malformed identifier.
    pub async fn build(listing: &dyn AssetListing, proxy: PullProxy) -> Result<Self> {
        let index = AssetIndex::build(listing).await?;
        Ok(Self::new(Arc::new(index), proxy))
    }

    /// The index this strategy resolves against.
    pub fn index(&self) -> &AssetIndex {
        &self.index
    }

    /// Resolves a request reference to an indexed asset.
    pub fn resolve(&self, reference: &str) -> Result<&Asset> {
        let found = match Resolution::parse(reference)? {
            Resolution::Digest { name, digest } => {
                tracing::info!(name = %name, digest = %digest, "resolving asset by digest");
                self.index.lookup_by_digest(&name, &digest)
            }
            Resolution::Tag { name, tag } => {
                tracing::info!(name = %name, tag = %tag, "resolving asset by tag");
                self.index.lookup_by_tag(&name, &tag)
            }
        };

        found.ok_or_else(|| GatewayError::NotFound {
            reference: reference.to_string(),
        })
    }
}

impl ResolutionStrategy for IndexStrategy {
    fn name(&self) -> &'static str {
        "index"
    }

    fn routes(self) -> Router {
        Router::new()
            .route("/assets", get(list_assets))
            .route("/:reference", get(pull_asset))
            .with_state(self)
    }
}

async fn list_assets(State(strategy): State<IndexStrategy>) -> Response {
    Json(strategy.index.as_ref()).into_response()
}

/// The single path segment of `uri`, still percent-encoded.
///
/// Listed names keep their encoding (`team%2Fweb`), so lookups must not
/// decode the request path.
pub(crate) fn raw_segment(uri: &Uri) -> &str {
    let path = uri.path();
    path.strip_prefix('/').unwrap_or(path)
}

async fn pull_asset(State(strategy): State<IndexStrategy>, uri: Uri) -> Result<Response> {
    let reference = raw_segment(&uri);
    let asset = strategy.resolve(reference)?;
    let artifact = strategy.proxy.fetch(asset).await?;
    tracing::info!(
        reference = %reference,
        uri = %asset.uri,
        bytes = artifact.data.len(),
        "streaming artifact"
    );
    Ok(pull::stream(artifact))
}
