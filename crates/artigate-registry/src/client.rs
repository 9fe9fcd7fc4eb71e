//! OCI Distribution API client for chart pulls.
//!
//! Every pull is preceded by a fresh login; nothing is cached between calls.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::StatusCode;
use sha2::{Digest, Sha256};

use crate::config::RegistryConfig;
use crate::credentials::Credential;
use crate::error::RegistryError;
use crate::oci::{ChartMeta, Manifest, MediaType, TokenResponse};
use crate::reference::Reference;

/// Authorization obtained by a login, valid for one registry host.
#[derive(Debug, Clone)]
pub struct Session {
    registry: String,
    authorization: Option<HeaderValue>,
}

impl Session {
    /// Creates a session for `registry` with an optional `Authorization` value.
    #[must_use]
    pub const fn new(registry: String, authorization: Option<HeaderValue>) -> Self {
        Self {
            registry,
            authorization,
        }
    }
}

/// A pulled chart: its metadata and the full archive bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulledArtifact {
    /// Chart metadata from the config blob.
    pub meta: ChartMeta,
    /// Complete chart archive.
    pub data: Vec<u8>,
}

impl PulledArtifact {
    /// Download file name, `{name}-{version}.tgz`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}-{}.tgz", self.meta.name, self.meta.version)
    }
}

/// Login and pull operations against an artifact's own registry.
#[async_trait]
pub trait ArtifactPuller: Send + Sync {
    /// Authenticates against the registry that hosts `uri`.
    async fn login(&self, uri: &str, credential: &Credential) -> Result<Session, RegistryError>;

    /// Fetches the complete artifact at `uri`.
    async fn pull(&self, session: &Session, uri: &str) -> Result<PulledArtifact, RegistryError>;
}

/// reqwest-backed OCI registry client.
#[derive(Debug, Clone)]
pub struct OciClient {
    config: RegistryConfig,
    http: reqwest::Client,
}

impl OciClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let http =
            crate::config::build_http_client(config.timeout, &config.user_agent, config.tls.as_ref())?;
        Ok(Self { config, http })
    }

    fn base_url(&self, registry: &str) -> String {
        format!("{}://{registry}", self.config.scheme())
    }

    async fn fetch_token(
        &self,
        reference: &Reference,
        challenge: &Challenge,
        basic: Option<&HeaderValue>,
    ) -> Result<HeaderValue, RegistryError> {
        let realm = challenge.params.get("realm").ok_or_else(|| {
            RegistryError::AuthenticationFailed {
                registry: reference.registry.clone(),
                message: "bearer challenge without realm".to_string(),
            }
        })?;

        let mut url = url::Url::parse(realm).map_err(|_| RegistryError::InvalidUrl {
            url: realm.clone(),
        })?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(service) = challenge.params.get("service") {
                query.append_pair("service", service);
            }
            query.append_pair("scope", &format!("repository:{}:pull", reference.repository));
        }

        let mut request = self.http.get(url);
        if let Some(basic) = basic {
            request = request.header(AUTHORIZATION, basic.clone());
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::AuthenticationFailed {
                registry: reference.registry.clone(),
                message: format!("token endpoint returned {status}"),
            });
        }

        let token = response
            .json::<TokenResponse>()
            .await?
            .into_token()
            .ok_or_else(|| RegistryError::AuthenticationFailed {
                registry: reference.registry.clone(),
                message: "token endpoint returned no token".to_string(),
            })?;

        let mut header = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            RegistryError::AuthenticationFailed {
                registry: reference.registry.clone(),
                message: "token is not a valid header value".to_string(),
            }
        })?;
        header.set_sensitive(true);
        Ok(header)
    }

    /// GETs `path` on the session's registry and maps error statuses.
    async fn get(
        &self,
        session: &Session,
        reference: &Reference,
        path: &str,
        accept: Option<&str>,
    ) -> Result<reqwest::Response, RegistryError> {
        let url = format!("{}/v2/{}/{path}", self.base_url(&reference.registry), reference.repository);

        let mut request = self.http.get(&url);
        if let Some(ref auth) = session.authorization {
            request = request.header(AUTHORIZATION, auth.clone());
        }
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        let response = request.send().await?;

        match response.status() {
            s if s.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(RegistryError::NotFound {
                reference: reference.to_string(),
            }),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(RegistryError::AuthenticationFailed {
                    registry: reference.registry.clone(),
                    message: format!("{} denied for {path}", response.status()),
                })
            }
            status => Err(RegistryError::HttpError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn fetch_blob(
        &self,
        session: &Session,
        reference: &Reference,
        digest: &str,
    ) -> Result<Vec<u8>, RegistryError> {
        let response = self
            .get(session, reference, &format!("blobs/{digest}"), None)
            .await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ArtifactPuller for OciClient {
    async fn login(&self, uri: &str, credential: &Credential) -> Result<Session, RegistryError> {
        let reference = Reference::parse(uri)?;
        let basic = credential.to_auth().header_value()?;
        let ping = format!("{}/v2/", self.base_url(&reference.registry));

        let response = self.http.get(&ping).send().await?;
        let status = response.status();

        if status.is_success() {
            tracing::debug!(registry = %reference.registry, "registry allows anonymous access");
            return Ok(Session::new(reference.registry, basic));
        }
        if status != StatusCode::UNAUTHORIZED {
            return Err(RegistryError::HttpError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_challenge)
            .ok_or_else(|| RegistryError::AuthenticationFailed {
                registry: reference.registry.clone(),
                message: "missing or unreadable WWW-Authenticate challenge".to_string(),
            })?;

        let authorization = if challenge.scheme.eq_ignore_ascii_case("bearer") {
            self.fetch_token(&reference, &challenge, basic.as_ref()).await?
        } else if challenge.scheme.eq_ignore_ascii_case("basic") {
            let basic = basic.ok_or_else(|| RegistryError::AuthenticationFailed {
                registry: reference.registry.clone(),
                message: "registry requires basic credentials".to_string(),
            })?;
            let check = self
                .http
                .get(&ping)
                .header(AUTHORIZATION, basic.clone())
                .send()
                .await?;
            if !check.status().is_success() {
                return Err(RegistryError::AuthenticationFailed {
                    registry: reference.registry,
                    message: format!("basic login rejected with {}", check.status()),
                });
            }
            basic
        } else {
            return Err(RegistryError::AuthenticationFailed {
                registry: reference.registry,
                message: format!("unsupported auth scheme '{}'", challenge.scheme),
            });
        };

        tracing::debug!(registry = %reference.registry, scheme = %challenge.scheme, "registry login succeeded");
        Ok(Session::new(reference.registry, Some(authorization)))
    }

    async fn pull(&self, session: &Session, uri: &str) -> Result<PulledArtifact, RegistryError> {
        let reference = Reference::parse(uri)?;
        if session.registry != reference.registry {
            return Err(RegistryError::AuthenticationFailed {
                registry: reference.registry,
                message: format!("session belongs to {}", session.registry),
            });
        }

        let accept = format!("{}, {}", MediaType::OCI_MANIFEST, MediaType::DOCKER_MANIFEST);
        let manifest: Manifest = self
            .get(
                session,
                &reference,
                &format!("manifests/{}", reference.reference),
                Some(&accept),
            )
            .await?
            .json()
            .await?;

        if !manifest.is_chart() {
            return Err(RegistryError::UnsupportedArtifact {
                reference: reference.to_string(),
                message: format!("config media type is {}", manifest.config.media_type),
            });
        }
        let layer = manifest
            .chart_layer()
            .ok_or_else(|| RegistryError::UnsupportedArtifact {
                reference: reference.to_string(),
                message: "manifest has no chart content layer".to_string(),
            })?
            .clone();

        let config = self
            .fetch_blob(session, &reference, &manifest.config.digest)
            .await?;
        let meta: ChartMeta = serde_json::from_slice(&config)?;

        let data = self.fetch_blob(session, &reference, &layer.digest).await?;
        if data.len() as u64 != layer.size {
            return Err(RegistryError::UnsupportedArtifact {
                reference: reference.to_string(),
                message: format!(
                    "chart size mismatch: expected {}, got {}",
                    layer.size,
                    data.len()
                ),
            });
        }
        if layer.digest_algorithm() == "sha256" {
            let actual = compute_digest(&data);
            if actual != layer.digest {
                return Err(RegistryError::DigestMismatch {
                    reference: reference.to_string(),
                    expected: layer.digest,
                    actual,
                });
            }
        }

        tracing::debug!(
            reference = %reference,
            chart = %meta.name,
            version = %meta.version,
            bytes = data.len(),
            "pulled chart"
        );

        Ok(PulledArtifact { meta, data })
    }
}

/// Parsed `WWW-Authenticate` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Challenge {
    scheme: String,
    params: HashMap<String, String>,
}

/// Parses `Scheme key="value", key2=value2`. Quoted values may hold commas.
fn parse_challenge(header: &str) -> Option<Challenge> {
    let header = header.trim();
    let (scheme, rest) = header.split_once(' ').unwrap_or((header, ""));
    if scheme.is_empty() {
        return None;
    }

    let mut params = HashMap::new();
    let mut chars = rest.chars().peekable();
    loop {
        while chars.peek().is_some_and(|c| *c == ',' || c.is_whitespace()) {
            chars.next();
        }
        let key: String = chars.by_ref().take_while(|c| *c != '=').collect();
        if key.is_empty() {
            break;
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => value.extend(chars.next()),
                    '"' => break,
                    _ => value.push(c),
                }
            }
        } else {
            while let Some(c) = chars.next_if(|c| *c != ',') {
                value.push(c);
            }
        }
        params.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
    }

    Some(Challenge {
        scheme: scheme.to_string(),
        params,
    })
}

/// Computes SHA-256 digest of data.
fn compute_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("sha256:{}", hex::encode(hasher.finalize()))
}
