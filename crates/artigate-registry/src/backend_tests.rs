//! Client tests against in-process stub backends.
//!
//! Each test binds an axum stub on `127.0.0.1:0` and talks to it over plain
//! HTTP, exercising the real request, auth and verification paths.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use artigate_core::{AssetIndex, RepositoryPath};
use axum::extract::{Path, Query, State};
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use base64::Engine as _;
use serde_json::json;
use sha2::{Digest, Sha256};
use tokio::net::TcpListener;

use crate::client::{ArtifactPuller, OciClient};
use crate::config::{ListingConfig, RegistryAuth, RegistryConfig};
use crate::credentials::{Credential, JSON_KEY_PRINCIPAL};
use crate::error::RegistryError;
use crate::listing::{ArtifactRegistryClient, ImageMetadata};
use crate::oci::MediaType;

const SECRET: &str = "key-material";
const TOKEN: &str = "t0k";
const SERVICE: &str = "stub-registry";
const CHART: &[u8] = b"\x1f\x8b\x08 chart archive bytes";

type Seen = Mutex<Vec<(HashMap<String, String>, Option<String>)>>;

fn sha256(data: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(data)))
}

fn basic_header(secret: &str) -> String {
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!("{JSON_KEY_PRINCIPAL}:{secret}"));
    format!("Basic {encoded}")
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

async fn spawn(app: Router, listener: TcpListener) {
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthMode {
    Bearer,
    Basic,
}

/// Knobs for the chart served by the stub registry.
struct ChartSpec {
    mode: AuthMode,
    deny_token: bool,
    config_media_type: &'static str,
    layer_digest: String,
    layer_size: u64,
}

impl ChartSpec {
    fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            deny_token: false,
            config_media_type: MediaType::HELM_CONFIG,
            layer_digest: sha256(CHART),
            layer_size: CHART.len() as u64,
        }
    }
}

struct StubRegistry {
    addr: SocketAddr,
    mode: AuthMode,
    deny_token: bool,
    manifest: serde_json::Value,
    blobs: HashMap<String, Vec<u8>>,
    token_requests: Seen,
}

impl StubRegistry {
    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = match self.mode {
            AuthMode::Bearer => format!("Bearer {TOKEN}"),
            AuthMode::Basic => basic_header(SECRET),
        };
        authorization(headers).as_deref() == Some(expected.as_str())
    }
}

async fn start_registry(spec: ChartSpec) -> (String, Arc<StubRegistry>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let config = json!({ "name": "web", "version": "1.0.0", "appVersion": "2.1" })
        .to_string()
        .into_bytes();
    let config_digest = sha256(&config);
    let manifest = json!({
        "schemaVersion": 2,
        "mediaType": MediaType::OCI_MANIFEST,
        "config": {
            "mediaType": spec.config_media_type,
            "digest": config_digest,
            "size": config.len(),
        },
        "layers": [{
            "mediaType": MediaType::HELM_CHART,
            "digest": spec.layer_digest,
            "size": spec.layer_size,
        }],
    });

    let mut blobs = HashMap::new();
    blobs.insert(config_digest, config);
    blobs.insert(spec.layer_digest.clone(), CHART.to_vec());

    let stub = Arc::new(StubRegistry {
        addr,
        mode: spec.mode,
        deny_token: spec.deny_token,
        manifest,
        blobs,
        token_requests: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/v2/", get(ping))
        .route("/token", get(token))
        .route("/v2/:ns/:repo/manifests/:reference", get(manifest_handler))
        .route("/v2/:ns/:repo/blobs/:digest", get(blob))
        .with_state(Arc::clone(&stub));
    spawn(app, listener).await;

    (addr.to_string(), stub)
}

async fn ping(State(stub): State<Arc<StubRegistry>>, headers: HeaderMap) -> Response {
    if stub.authorized(&headers) {
        return StatusCode::OK.into_response();
    }
    let challenge = match stub.mode {
        AuthMode::Bearer => format!(
            r#"Bearer realm="http://{}/token",service="{SERVICE}""#,
            stub.addr
        ),
        AuthMode::Basic => r#"Basic realm="stub""#.to_string(),
    };
    (StatusCode::UNAUTHORIZED, [(WWW_AUTHENTICATE, challenge)]).into_response()
}

async fn token(
    State(stub): State<Arc<StubRegistry>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let presented = authorization(&headers);
    let accepted = presented.as_deref() == Some(basic_header(SECRET).as_str());
    stub.token_requests.lock().unwrap().push((params, presented));

    if stub.deny_token || !accepted {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({ "token": TOKEN })).into_response()
}

async fn manifest_handler(State(stub): State<Arc<StubRegistry>>, headers: HeaderMap) -> Response {
    if !stub.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    stub.manifest.to_string().into_response()
}

async fn blob(
    State(stub): State<Arc<StubRegistry>>,
    Path((_ns, _repo, digest)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    if !stub.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match stub.blobs.get(&digest) {
        Some(data) => data.clone().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn oci_client() -> OciClient {
    OciClient::new(RegistryConfig::default().with_plain_http(true)).unwrap()
}

fn credential(secret: &str) -> Credential {
    Credential::new(JSON_KEY_PRINCIPAL, secret)
}

async fn pull(spec: ChartSpec) -> Result<crate::client::PulledArtifact, RegistryError> {
    let (host, _stub) = start_registry(spec).await;
    let uri = format!("{host}/charts/web:1.0.0");
    let client = oci_client();
    let session = client.login(&uri, &credential(SECRET)).await?;
    client.pull(&session, &uri).await
}

#[tokio::test]
async fn test_bearer_login_and_pull() {
    let (host, stub) = start_registry(ChartSpec::new(AuthMode::Bearer)).await;
    let uri = format!("{host}/charts/web:1.0.0");
    let client = oci_client();

    let session = client.login(&uri, &credential(SECRET)).await.unwrap();
    let chart = client.pull(&session, &uri).await.unwrap();

    assert_eq!(chart.meta.name, "web");
    assert_eq!(chart.meta.version, "1.0.0");
    assert_eq!(chart.meta.app_version.as_deref(), Some("2.1"));
    assert_eq!(chart.data, CHART);
    assert_eq!(chart.file_name(), "web-1.0.0.tgz");

    let requests = stub.token_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (params, presented) = &requests[0];
    assert_eq!(params["scope"], "repository:charts/web:pull");
    assert_eq!(params["service"], SERVICE);
    assert_eq!(presented.as_deref(), Some(basic_header(SECRET).as_str()));
}

#[tokio::test]
async fn test_token_endpoint_rejection() {
    let mut spec = ChartSpec::new(AuthMode::Bearer);
    spec.deny_token = true;
    let (host, _stub) = start_registry(spec).await;

    let err = oci_client()
        .login(&format!("{host}/charts/web:1.0.0"), &credential(SECRET))
        .await
        .unwrap_err();
    match err {
        RegistryError::AuthenticationFailed { message, .. } => {
            assert!(message.contains("401"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_basic_login_and_pull() {
    let chart = pull(ChartSpec::new(AuthMode::Basic)).await.unwrap();
    assert_eq!(chart.data, CHART);
}

#[tokio::test]
async fn test_basic_login_rejected() {
    let (host, _stub) = start_registry(ChartSpec::new(AuthMode::Basic)).await;
    let err = oci_client()
        .login(&format!("{host}/charts/web:1.0.0"), &credential("wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn test_pull_rejects_non_chart_manifest() {
    let mut spec = ChartSpec::new(AuthMode::Bearer);
    spec.config_media_type = "application/vnd.oci.image.config.v1+json";
    let err = pull(spec).await.unwrap_err();
    assert!(matches!(err, RegistryError::UnsupportedArtifact { .. }));
}

#[tokio::test]
async fn test_pull_size_mismatch() {
    let mut spec = ChartSpec::new(AuthMode::Bearer);
    spec.layer_size += 1;
    match pull(spec).await.unwrap_err() {
        RegistryError::UnsupportedArtifact { message, .. } => {
            assert!(message.contains("size mismatch"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_pull_digest_mismatch() {
    let mut spec = ChartSpec::new(AuthMode::Bearer);
    spec.layer_digest = sha256(b"some other archive");
    let expected_digest = spec.layer_digest.clone();
    match pull(spec).await.unwrap_err() {
        RegistryError::DigestMismatch {
            expected, actual, ..
        } => {
            assert_eq!(expected, expected_digest);
            assert_eq!(actual, sha256(CHART));
        }
        other => panic!("unexpected error: {other}"),
    }
}

struct StubListing {
    requests: Seen,
}

const PARENT: &str = "projects/acme/locations/us-central1/repositories/charts";

async fn start_listing() -> (String, Arc<StubListing>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let stub = Arc::new(StubListing {
        requests: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route(
            "/v1/projects/:p/locations/:l/repositories/:r/dockerImages",
            get(list_images),
        )
        .route(
            "/v1/projects/:p/locations/:l/repositories/:r/dockerImages/:image",
            get(get_image),
        )
        .with_state(Arc::clone(&stub));
    spawn(app, listener).await;

    (format!("http://{addr}"), stub)
}

async fn list_images(
    State(stub): State<Arc<StubListing>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let second = params.get("pageToken").map(String::as_str) == Some("p2");
    stub.requests
        .lock()
        .unwrap()
        .push((params, authorization(&headers)));

    if second {
        Json(json!({
            "dockerImages": [{
                "name": format!("{PARENT}/dockerImages/api@sha256:2"),
                "uri": "us-central1-docker.pkg.dev/acme/charts/api@sha256:2",
            }],
        }))
    } else {
        Json(json!({
            "dockerImages": [{
                "name": format!("{PARENT}/dockerImages/web@sha256:1"),
                "uri": "us-central1-docker.pkg.dev/acme/charts/web@sha256:1",
                "tags": ["latest"],
            }],
            "nextPageToken": "p2",
        }))
    }
}

async fn get_image(Path(params): Path<HashMap<String, String>>) -> Response {
    let image = &params["image"];
    if image == "missing" {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!({ "name": format!("{PARENT}/dockerImages/{image}") })).into_response()
}

fn listing_client(endpoint: &str) -> ArtifactRegistryClient {
    let config = ListingConfig::new(RepositoryPath::new("acme", "us-central1", "charts"))
        .with_endpoint(endpoint)
        .with_auth(RegistryAuth::bearer("list-token"))
        .with_page_size(1);
    ArtifactRegistryClient::new(config).unwrap()
}

#[tokio::test]
async fn test_listing_pages_with_token_and_bearer() {
    let (endpoint, stub) = start_listing().await;
    let client = listing_client(&endpoint);

    let index = AssetIndex::build(&client).await.unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index.lookup_by_tag("web", "latest").unwrap().digest, "sha256:1");
    assert!(index.lookup_by_digest("api", "sha256:2").is_some());

    let requests = stub.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].0.get("pageSize").map(String::as_str), Some("1"));
    assert!(!requests[0].0.contains_key("pageToken"));
    assert_eq!(requests[1].0.get("pageToken").map(String::as_str), Some("p2"));
    for (_, presented) in requests.iter() {
        assert_eq!(presented.as_deref(), Some("Bearer list-token"));
    }
}

#[tokio::test]
async fn test_get_image() {
    let (endpoint, _stub) = start_listing().await;
    let client = listing_client(&endpoint);

    let resource = format!("{PARENT}/dockerImages/web@sha256:1");
    let document = client.get_image(&resource).await.unwrap();
    assert_eq!(document["name"], resource.as_str());

    let err = client
        .get_image(&format!("{PARENT}/dockerImages/missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotFound { .. }));
}
