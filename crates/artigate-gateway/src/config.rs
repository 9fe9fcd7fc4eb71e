//! Configuration types for the gateway.
//!
//! Values arrive from the environment through the CLI; this module only
//! validates and normalizes them.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use artigate_core::RepositoryPath;

use crate::error::{GatewayError, Result};

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "us-central1";

/// Listen address used when none is configured.
pub const DEFAULT_LISTEN: &str = ":8080";

/// Grace period for in-flight requests after a shutdown signal.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(15);

/// One allow-listed `principal:secret` pair.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthPair {
    /// Principal (basic auth user name).
    pub principal: String,
    /// Secret (basic auth password).
    pub secret: String,
}

impl fmt::Debug for AuthPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthPair")
            .field("principal", &self.principal)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl FromStr for AuthPair {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((principal, secret)) if !principal.is_empty() && !secret.is_empty() => Ok(Self {
                principal: principal.to_string(),
                secret: secret.to_string(),
            }),
            _ => Err(GatewayError::InvalidConfig {
                reason: "AUTHS entries must be 'principal:secret'".to_string(),
            }),
        }
    }
}

/// Parses a comma-separated `principal:secret` list. Blank entries are skipped.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidConfig`] if an entry lacks a principal or secret.
pub fn parse_auths(raw: &str) -> Result<Vec<AuthPair>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::parse)
        .collect()
}

/// Validated gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Backend project coordinate.
    pub project: String,

    /// Backend repository coordinate.
    pub repository: String,

    /// Backend region coordinate.
    pub region: String,

    /// Listener address, normalized to `host:port`.
    pub listen: String,

    /// Secret file used for backend authentication.
    pub credential_path: PathBuf,

    /// Metadata gateway allow-list.
    pub auths: Vec<AuthPair>,

    /// Whether the metadata gateway enforces the allow-list.
    pub enforce_auths: bool,

    /// Grace period for in-flight requests on shutdown.
    pub shutdown_grace: Duration,

    /// Timeout of backend HTTP requests.
    pub request_timeout: Duration,

    /// Artifact listing REST endpoint.
    pub listing_endpoint: Option<String>,

    /// Bearer token for the listing API.
    pub listing_token: Option<String>,
}

impl GatewayConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::default()
    }

    /// Repository coordinate for backend lookups.
    pub fn repository_path(&self) -> RepositoryPath {
        RepositoryPath::new(&self.project, &self.region, &self.repository)
    }
}

/// Builder for `GatewayConfig`.
#[derive(Debug, Default)]
pub struct GatewayConfigBuilder {
    project: Option<String>,
    repository: Option<String>,
    region: Option<String>,
    listen: Option<String>,
    credential_path: Option<PathBuf>,
    auths: Vec<AuthPair>,
    enforce_auths: bool,
    shutdown_grace: Option<Duration>,
    request_timeout: Option<Duration>,
    listing_endpoint: Option<String>,
    listing_token: Option<String>,
}

impl GatewayConfigBuilder {
    /// Sets the project.
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Sets the repository.
    pub fn repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    /// Sets the region.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Sets the listen address (`:8080`, `8080` or `host:port`).
    pub fn listen(mut self, listen: impl Into<String>) -> Self {
        self.listen = Some(listen.into());
        self
    }

    /// Sets the credential file path.
    pub fn credential_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credential_path = Some(path.into());
        self
    }

    /// Sets the metadata allow-list.
    pub fn auths(mut self, auths: Vec<AuthPair>) -> Self {
        self.auths = auths;
        self
    }

    /// Enables or disables allow-list enforcement.
    pub fn enforce_auths(mut self, enforce: bool) -> Self {
        self.enforce_auths = enforce;
        self
    }

    /// Sets the shutdown grace period.
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = Some(grace);
        self
    }

    /// Sets the backend request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the listing endpoint.
    pub fn listing_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.listing_endpoint = Some(endpoint.into());
        self
    }

    /// Sets the listing bearer token.
    pub fn listing_token(mut self, token: impl Into<String>) -> Self {
        self.listing_token = Some(token.into());
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] when a required value is
    /// missing or empty, the listen address is malformed, or enforcement is
    /// requested with an empty allow-list.
    pub fn build(self) -> Result<GatewayConfig> {
        let project = required("PROJECT", self.project)?;
        let repository = required("REPOSITORY", self.repository)?;
        let credential_path = self
            .credential_path
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| missing("CREDENTIAL_PATH"))?;

        let region = self
            .region
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let listen = normalize_listen(self.listen.as_deref().unwrap_or(DEFAULT_LISTEN))?;

        if self.enforce_auths && self.auths.is_empty() {
            return Err(GatewayError::InvalidConfig {
                reason: "ENFORCE_AUTHS is set but AUTHS is empty".to_string(),
            });
        }

        Ok(GatewayConfig {
            project,
            repository,
            region,
            listen,
            credential_path,
            auths: self.auths,
            enforce_auths: self.enforce_auths,
            shutdown_grace: self.shutdown_grace.unwrap_or(DEFAULT_SHUTDOWN_GRACE),
            request_timeout: self.request_timeout.unwrap_or(Duration::from_secs(60)),
            listing_endpoint: self.listing_endpoint.filter(|e| !e.is_empty()),
            listing_token: self.listing_token.filter(|t| !t.is_empty()),
        })
    }
}

fn missing(name: &str) -> GatewayError {
    GatewayError::InvalidConfig {
        reason: format!("missing {name}"),
    }
}

fn required(name: &str, value: Option<String>) -> Result<String> {
    value.filter(|v| !v.is_empty()).ok_or_else(|| missing(name))
}

/// Normalizes `:8080` and `8080` to `0.0.0.0:8080`; `host:port` is kept.
fn normalize_listen(listen: &str) -> Result<String> {
    let invalid = || GatewayError::InvalidConfig {
        reason: format!("invalid listen address '{listen}'"),
    };

    let (host, port) = match listen.rsplit_once(':') {
        Some((host, port)) => (host, port),
        None => ("", listen),
    };
    port.parse::<u16>().map_err(|_| invalid())?;

    let host = if host.is_empty() { "0.0.0.0" } else { host };
    Ok(format!("{host}:{port}"))
}
