//! Local credential material for registry logins.

use std::fmt;
use std::io;
use std::path::Path;

use crate::config::RegistryAuth;
use crate::error::RegistryError;

/// Principal used when a service-account key file is the password.
pub const JSON_KEY_PRINCIPAL: &str = "_json_key";

/// A principal/secret pair read from disk.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Login principal.
    pub principal: String,
    /// Secret material.
    pub secret: String,
}

impl Credential {
    /// Creates a credential.
    #[must_use]
    pub fn new(principal: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            secret: secret.into(),
        }
    }

    /// Basic authentication for this credential.
    #[must_use]
    pub fn to_auth(&self) -> RegistryAuth {
        RegistryAuth::basic(&self.principal, &self.secret)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("principal", &self.principal)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Reads the whole secret file at `path`.
///
/// The file content becomes the secret and [`JSON_KEY_PRINCIPAL`] the
/// principal. The file is read fresh on every call. Its bytes are used
/// unchanged and must be UTF-8, since they travel in a basic-auth header.
///
/// # Errors
///
/// Returns [`RegistryError::CredentialUnavailable`] on any read failure or
/// when the content is not UTF-8.
pub async fn read_credential(path: impl AsRef<Path>) -> Result<Credential, RegistryError> {
    let path = path.as_ref();
    let unavailable = |source| RegistryError::CredentialUnavailable {
        path: path.to_path_buf(),
        source,
    };

    let bytes = tokio::fs::read(path).await.map_err(unavailable)?;
    let secret = String::from_utf8(bytes).map_err(|e| {
        let offset = e.utf8_error().valid_up_to();
        unavailable(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("credential file is not UTF-8 (invalid byte at offset {offset})"),
        ))
    })?;

    Ok(Credential::new(JSON_KEY_PRINCIPAL, secret))
}
