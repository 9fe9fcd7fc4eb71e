//! Test doubles shared by the gateway integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use artigate_core::{AssetListing, BoxError, ListedArtifact, ListingPage};
use artigate_gateway::{IndexStrategy, PullProxy};
use artigate_registry::{
    ArtifactPuller, ChartMeta, Credential, ImageMetadata, PulledArtifact, RegistryError, Session,
};
use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::sync::Notify;

/// Backend resource prefix used by the fixtures.
pub const PREFIX: &str = "projects/acme/locations/us-central1/repositories/charts/dockerImages";

/// Listing served from memory in a single page.
pub struct StaticListing(pub Vec<ListedArtifact>);

#[async_trait]
impl AssetListing for StaticListing {
    async fn list_page(&self, _page_token: Option<&str>) -> Result<ListingPage, BoxError> {
        Ok(ListingPage {
            items: self.0.clone(),
            next_page_token: None,
        })
    }
}

/// The fixture listing: `a`, `b` (tagged `v1` and `latest`) and `c`.
pub fn listing() -> StaticListing {
    StaticListing(vec![
        ListedArtifact::new(format!("{PREFIX}/a@sha256:0"), "registry.test/charts/a@sha256:0"),
        ListedArtifact::new(format!("{PREFIX}/b@sha256:1"), "registry.test/charts/b@sha256:1")
            .with_tag("v1")
            .with_tag("latest"),
        ListedArtifact::new(format!("{PREFIX}/c@sha256:2"), "registry.test/charts/c@sha256:2"),
    ])
}

/// Puller that counts calls, can fail once, and can stall inside `pull`.
#[derive(Default)]
pub struct CountingPuller {
    pub logins: AtomicUsize,
    pub pulls: AtomicUsize,
    pub fail_next: AtomicBool,
    pub delay: Option<Duration>,
    pub pulling: Notify,
}

impl CountingPuller {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn backend_calls(&self) -> usize {
        self.logins.load(Ordering::SeqCst) + self.pulls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactPuller for CountingPuller {
    async fn login(&self, uri: &str, _credential: &Credential) -> Result<Session, RegistryError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        let registry = uri.split('/').next().unwrap_or_default().to_string();
        Ok(Session::new(registry, None))
    }

    async fn pull(&self, _session: &Session, uri: &str) -> Result<PulledArtifact, RegistryError> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        self.pulling.notify_one();

        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(RegistryError::HttpError {
                status: 503,
                message: "registry unavailable".to_string(),
            });
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let name = uri
            .rsplit('/')
            .next()
            .and_then(|last| last.split('@').next())
            .unwrap_or_default()
            .to_string();
        Ok(PulledArtifact {
            meta: ChartMeta {
                name,
                version: "1.0.0".to_string(),
                app_version: None,
                description: None,
            },
            data: format!("chart:{uri}").into_bytes(),
        })
    }
}

/// Metadata backend that echoes the requested resource.
#[derive(Default)]
pub struct EchoMetadata {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl ImageMetadata for EchoMetadata {
    async fn get_image(&self, resource: &str) -> Result<serde_json::Value, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RegistryError::NotFound {
                reference: resource.to_string(),
            });
        }
        Ok(serde_json::json!({ "name": resource }))
    }
}

/// Credential file holding a dummy key.
pub fn credential_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{\"type\":\"service_account\"}}").unwrap();
    file
}

/// Builds an index strategy over the fixture listing.
pub async fn index_strategy(puller: Arc<CountingPuller>, key: &NamedTempFile) -> IndexStrategy {
    let proxy = PullProxy::new(puller, key.path());
    IndexStrategy::build(&listing(), proxy).await.unwrap()
}
