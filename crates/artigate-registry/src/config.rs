//! Configuration types for the backend clients.

use std::path::PathBuf;
use std::time::Duration;

use artigate_core::RepositoryPath;
use reqwest::header::HeaderValue;

use crate::error::RegistryError;

/// Default Artifact Registry REST endpoint.
pub const DEFAULT_LISTING_ENDPOINT: &str = "https://artifactregistry.googleapis.com";

/// Configuration for the OCI registry client.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Request timeout.
    pub timeout: Duration,

    /// Talk plain HTTP instead of HTTPS to registries (local development).
    pub plain_http: bool,

    /// TLS configuration.
    pub tls: Option<TlsConfig>,

    /// User agent string.
    pub user_agent: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            plain_http: false,
            tls: None,
            user_agent: default_user_agent(),
        }
    }
}

impl RegistryConfig {
    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Switches registry traffic to plain HTTP.
    #[must_use]
    pub const fn with_plain_http(mut self, plain_http: bool) -> Self {
        self.plain_http = plain_http;
        self
    }

    /// Sets the TLS configuration.
    #[must_use]
    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// URL scheme used for registry hosts.
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        if self.plain_http {
            "http"
        } else {
            "https"
        }
    }
}

/// Configuration for the artifact listing client.
#[derive(Debug, Clone)]
pub struct ListingConfig {
    /// REST endpoint (e.g., "<https://artifactregistry.googleapis.com>").
    pub endpoint: String,

    /// Repository whose artifacts are listed.
    pub repository: RepositoryPath,

    /// Items requested per page.
    pub page_size: u32,

    /// Authentication for the listing API.
    pub auth: RegistryAuth,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl ListingConfig {
    /// Creates a listing configuration for a repository with default settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use artigate_core::RepositoryPath;
    /// use artigate_registry::ListingConfig;
    ///
    /// let config = ListingConfig::new(RepositoryPath::new("acme", "us-central1", "charts"));
    /// assert_eq!(config.endpoint, "https://artifactregistry.googleapis.com");
    /// assert_eq!(config.page_size, 500);
    /// ```
    #[must_use]
    pub fn new(repository: RepositoryPath) -> Self {
        Self {
            endpoint: DEFAULT_LISTING_ENDPOINT.to_string(),
            repository,
            page_size: 500,
            auth: RegistryAuth::None,
            timeout: Duration::from_secs(30),
            user_agent: default_user_agent(),
        }
    }

    /// Sets the REST endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the authentication method.
    #[must_use]
    pub fn with_auth(mut self, auth: RegistryAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Authentication methods for backend access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryAuth {
    /// No authentication.
    None,

    /// Basic authentication (username/password or principal/key).
    Basic {
        /// Username.
        username: String,
        /// Password or key material.
        password: String,
    },

    /// Bearer token authentication (`OAuth2` access token).
    Bearer {
        /// Token value.
        token: String,
    },
}

impl RegistryAuth {
    /// Creates basic authentication.
    ///
    /// # Examples
    ///
    /// ```
    /// use artigate_registry::RegistryAuth;
    ///
    /// let auth = RegistryAuth::basic("user", "pass");
    /// ```
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Creates bearer token authentication.
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Returns the `Authorization` header value, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials cannot form a valid header.
    pub fn header_value(&self) -> Result<Option<HeaderValue>, RegistryError> {
        let value = match self {
            Self::None => return Ok(None),
            Self::Basic { username, password } => {
                let credentials = base64::Engine::encode(
                    &base64::engine::general_purpose::STANDARD,
                    format!("{username}:{password}"),
                );
                format!("Basic {credentials}")
            }
            Self::Bearer { token } => format!("Bearer {token}"),
        };

        let mut header = HeaderValue::from_str(&value).map_err(|_| RegistryError::InvalidConfig {
            message: "credentials contain characters not allowed in a header".to_string(),
        })?;
        header.set_sensitive(true);
        Ok(Some(header))
    }
}

/// TLS configuration for registry connections.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    /// Path to an extra CA certificate file.
    pub ca_cert: Option<PathBuf>,

    /// Whether to skip certificate verification (NOT recommended for production).
    pub insecure_skip_verify: bool,
}

impl TlsConfig {
    /// Sets the CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert = Some(path.into());
        self
    }

    /// Enables insecure mode (skips certificate verification).
    #[must_use]
    pub const fn insecure(mut self) -> Self {
        self.insecure_skip_verify = true;
        self
    }
}

fn default_user_agent() -> String {
    format!("artigate/{}", env!("CARGO_PKG_VERSION"))
}

/// Builds a reqwest client with the shared timeout, user agent and TLS settings.
pub(crate) fn build_http_client(
    timeout: Duration,
    user_agent: &str,
    tls: Option<&TlsConfig>,
) -> Result<reqwest::Client, RegistryError> {
    let mut builder = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent);

    if let Some(tls) = tls {
        if tls.insecure_skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ref ca_cert) = tls.ca_cert {
            let cert_pem = std::fs::read(ca_cert).map_err(|e| RegistryError::InvalidConfig {
                message: format!("cannot read CA certificate {}: {e}", ca_cert.display()),
            })?;
            let cert = reqwest::Certificate::from_pem(&cert_pem).map_err(|e| {
                RegistryError::InvalidConfig {
                    message: format!("Invalid CA certificate: {e}"),
                }
            })?;
            builder = builder.add_root_certificate(cert);
        }
    }

    builder.build().map_err(|e| RegistryError::InvalidConfig {
        message: format!("cannot build HTTP client: {e}"),
    })
}
