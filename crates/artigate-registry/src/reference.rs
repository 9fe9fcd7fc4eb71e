//! Parsing of registry artifact URIs.

use std::fmt;

use crate::error::RegistryError;

/// A fully qualified artifact location: `registry/repository[:tag|@digest]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Registry host (with port, if any).
    pub registry: String,
    /// Repository path below the registry.
    pub repository: String,
    /// Tag or digest.
    pub reference: String,
}

impl Reference {
    /// Parses an artifact URI.
    ///
    /// A leading `oci://` is ignored. Without a tag or digest the reference
    /// defaults to `latest`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidReference`] if the URI has no
    /// repository part or an empty tag or digest.
    ///
    /// # Examples
    ///
    /// ```
    /// use artigate_registry::Reference;
    ///
    /// let r = Reference::parse("us-central1-docker.pkg.dev/acme/charts/web@sha256:abc")?;
    /// assert_eq!(r.registry, "us-central1-docker.pkg.dev");
    /// assert_eq!(r.repository, "acme/charts/web");
    /// assert_eq!(r.reference, "sha256:abc");
    /// # Ok::<(), artigate_registry::RegistryError>(())
    /// ```
    pub fn parse(uri: &str) -> Result<Self, RegistryError> {
        let invalid = || RegistryError::InvalidReference {
            reference: uri.to_string(),
        };

        let trimmed = uri.strip_prefix("oci://").unwrap_or(uri);
        let (registry, rest) = trimmed.split_once('/').ok_or_else(invalid)?;
        if registry.is_empty() || rest.is_empty() {
            return Err(invalid());
        }

        let (repository, reference) = if let Some((repo, digest)) = rest.split_once('@') {
            (repo, digest)
        } else {
            // A ':' in the last path segment separates the tag.
            let last_slash = rest.rfind('/').map_or(0, |i| i + 1);
            match rest[last_slash..].find(':') {
                Some(colon) => {
                    let at = last_slash + colon;
                    (&rest[..at], &rest[at + 1..])
                }
                None => (rest, "latest"),
            }
        };

        if repository.is_empty() || reference.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            registry: registry.to_string(),
            repository: repository.to_string(),
            reference: reference.to_string(),
        })
    }

    /// Returns true if the reference is a content digest.
    #[must_use]
    pub fn is_digest(&self) -> bool {
        self.reference.contains(':')
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = if self.is_digest() { '@' } else { ':' };
        write!(f, "{}/{}{sep}{}", self.registry, self.repository, self.reference)
    }
}
