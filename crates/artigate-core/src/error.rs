//! Error types for index construction.
//!
//! Both variants are fatal at startup: the gateway never serves with a
//! missing or partial index.

use thiserror::Error;

use crate::listing::BoxError;

/// Result type alias using [`IndexError`] as the error type.
pub type Result<T> = std::result::Result<T, IndexError>;

/// A backend resource identifier that does not have the
/// `.../{name}@{digest}` shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed resource name '{raw}': {reason}")]
pub struct MalformedResourceName {
    /// The identifier as reported by the listing.
    pub raw: String,
    /// Why it was rejected.
    pub reason: &'static str,
}

impl MalformedResourceName {
    pub(crate) fn new(raw: &str, reason: &'static str) -> Self {
        Self {
            raw: raw.to_string(),
            reason,
        }
    }
}

/// Errors that can occur while building an [`AssetIndex`](crate::AssetIndex).
#[derive(Error, Debug)]
pub enum IndexError {
    /// The paginated listing itself failed.
    #[error("failed to list artifacts (page {page}): {source}")]
    BuildFailed {
        /// One-based number of the page that failed.
        page: usize,
        /// Underlying listing error.
        #[source]
        source: BoxError,
    },

    /// A listed identifier could not be parsed, so the build was aborted.
    #[error(transparent)]
    MalformedResourceName(#[from] MalformedResourceName),
}
