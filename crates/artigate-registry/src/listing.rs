//! Artifact Registry REST client: paginated listing and image lookups.

use artigate_core::{AssetListing, BoxError, ListingPage, RepositoryPath};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;

use crate::config::ListingConfig;
use crate::error::RegistryError;

/// Structured metadata lookup for a single image resource.
#[async_trait]
pub trait ImageMetadata: Send + Sync {
    /// Fetches the metadata document of `resource`
    /// (`projects/.../dockerImages/{image}`).
    async fn get_image(&self, resource: &str) -> Result<serde_json::Value, RegistryError>;
}

/// Client for the Artifact Registry `dockerImages` API.
#[derive(Debug, Clone)]
pub struct ArtifactRegistryClient {
    config: ListingConfig,
    http: reqwest::Client,
}

impl ArtifactRegistryClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a valid URL or the HTTP client
    /// cannot be created.
    pub fn new(config: ListingConfig) -> Result<Self, RegistryError> {
        url::Url::parse(&config.endpoint).map_err(|_| RegistryError::InvalidUrl {
            url: config.endpoint.clone(),
        })?;
        let http = crate::config::build_http_client(config.timeout, &config.user_agent, None)?;
        Ok(Self { config, http })
    }

    /// Repository this client lists.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryPath {
        &self.config.repository
    }

    fn resource_url(&self, resource: &str) -> String {
        format!("{}/v1/{resource}", self.config.endpoint.trim_end_matches('/'))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, RegistryError> {
        let mut request = self.http.get(url).query(query);
        if let Some(auth) = self.config.auth.header_value()? {
            request = request.header(AUTHORIZATION, auth);
        }
        let response = request.send().await?;

        match response.status() {
            s if s.is_success() => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(RegistryError::NotFound {
                reference: url.to_string(),
            }),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(RegistryError::AuthenticationFailed {
                    registry: self.config.endpoint.clone(),
                    message: response.text().await.unwrap_or_default(),
                })
            }
            status => Err(RegistryError::HttpError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Fetches one page of the repository listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the page cannot be decoded.
    pub async fn fetch_page(&self, page_token: Option<&str>) -> Result<ListingPage, RegistryError> {
        let url = self.resource_url(&format!("{}/dockerImages", self.config.repository));
        let mut query = vec![("pageSize", self.config.page_size.to_string())];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }
        self.get_json(&url, &query).await
    }
}

#[async_trait]
impl AssetListing for ArtifactRegistryClient {
    async fn list_page(&self, page_token: Option<&str>) -> Result<ListingPage, BoxError> {
        self.fetch_page(page_token).await.map_err(Into::into)
    }
}

#[async_trait]
impl ImageMetadata for ArtifactRegistryClient {
    async fn get_image(&self, resource: &str) -> Result<serde_json::Value, RegistryError> {
        self.get_json(&self.resource_url(resource), &[]).await
    }
}
