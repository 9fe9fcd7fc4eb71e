//! Immutable asset index.
//!
//! The index is built once from a complete listing and then only read.
//! It exposes no mutating method, so an `Arc<AssetIndex>` can be shared
//! across request tasks without locking.

use std::collections::{HashMap, HashSet};

use serde::ser::SerializeStruct;
use serde::Serialize;

use crate::asset::Asset;
use crate::error::{IndexError, MalformedResourceName, Result};
use crate::listing::{AssetListing, ListedArtifact};

/// Ordered, read-only collection of [`Asset`] records.
///
/// Listing order is preserved and used to break ties: when several assets
/// match a lookup, the one listed first wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetIndex {
    assets: Vec<Asset>,
    /// Positions in `assets` per name, ascending.
    by_name: HashMap<String, Vec<usize>>,
}

impl AssetIndex {
    /// Builds the index by paging through the whole listing.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::BuildFailed`] if any page cannot be fetched and
    /// [`IndexError::MalformedResourceName`] if any listed identifier cannot
    /// be parsed. No partial index is returned in either case. A page token
    /// that repeats is reported as [`IndexError::BuildFailed`] instead of
    /// paging forever.
    pub async fn build(listing: &dyn AssetListing) -> Result<Self> {
        let mut records = Vec::new();
        let mut token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        let mut pages = 0usize;

        loop {
            pages += 1;
            let page = listing
                .list_page(token.as_deref())
                .await
                .map_err(|source| IndexError::BuildFailed {
                    page: pages,
                    source,
                })?;

            tracing::debug!(page = pages, items = page.items.len(), "fetched listing page");

            token = page.next_token().map(ToString::to_string);
            records.extend(page.items);

            match token {
                None => break,
                Some(ref next) if !seen_tokens.insert(next.clone()) => {
                    return Err(IndexError::BuildFailed {
                        page: pages,
                        source: format!("listing repeated page token '{next}'").into(),
                    });
                }
                Some(_) => {}
            }
        }

        let index = Self::from_records(records)?;
        tracing::info!(pages, assets = index.len(), "asset index built");
        Ok(index)
    }

    /// Builds the index from already-listed records.
    ///
    /// A repeated `(name, digest)` pair keeps its first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::MalformedResourceName`] on the first record whose
    /// identifier cannot be parsed.
    pub fn from_records(records: impl IntoIterator<Item = ListedArtifact>) -> Result<Self> {
        let mut assets = Vec::new();
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for record in records {
            let (name, digest) = parse_resource_name(&record.name)?;

            if !seen.insert((name.clone(), digest.clone())) {
                tracing::warn!(
                    name = %name,
                    digest = %digest,
                    raw_name = %record.name,
                    "duplicate asset in listing, keeping first occurrence"
                );
                continue;
            }

            by_name.entry(name.clone()).or_default().push(assets.len());
            assets.push(Asset {
                name,
                digest,
                raw_name: record.name,
                uri: record.uri,
                media_type: record.media_type,
                tags: record.tags,
                upload_time: record.upload_time,
            });
        }

        Ok(Self { assets, by_name })
    }

    /// Finds the asset with exactly this name and digest.
    #[must_use]
    pub fn lookup_by_digest(&self, name: &str, digest: &str) -> Option<&Asset> {
        self.named(name).find(|asset| asset.digest == digest)
    }

    /// Finds the first asset, in listing order, with this name and tag.
    #[must_use]
    pub fn lookup_by_tag(&self, name: &str, tag: &str) -> Option<&Asset> {
        self.named(name).find(|asset| asset.has_tag(tag))
    }

    /// Number of indexed assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Returns true if nothing was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Iterates over all assets in listing order.
    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter()
    }

    fn named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Asset> + 'a {
        self.by_name
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|&i| &self.assets[i])
    }
}

impl Serialize for AssetIndex {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AssetIndex", 1)?;
        state.serialize_field("assets", &self.assets)?;
        state.end()
    }
}

/// Splits a backend resource identifier into `(name, digest)`.
///
/// The identifier needs at least two `/`-separated segments, and the last
/// one must hold exactly one `@` with a non-empty name before it and a
/// non-empty digest after it.
///
/// # Errors
///
/// Returns [`MalformedResourceName`] if any of those conditions fail.
///
/// # Examples
///
/// ```
/// use artigate_core::parse_resource_name;
///
/// let (name, digest) = parse_resource_name(
///     "projects/p/locations/l/repositories/r/dockerImages/web@sha256:abc",
/// )?;
/// assert_eq!(name, "web");
/// assert_eq!(digest, "sha256:abc");
///
/// assert!(parse_resource_name("web@sha256:abc").is_err());
/// # Ok::<(), artigate_core::MalformedResourceName>(())
/// ```
pub fn parse_resource_name(
    raw: &str,
) -> std::result::Result<(String, String), MalformedResourceName> {
    let Some((_, last)) = raw.rsplit_once('/') else {
        return Err(MalformedResourceName::new(
            raw,
            "expected at least two path segments",
        ));
    };

    let mut parts = last.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(digest), None) => {
            if name.is_empty() || digest.is_empty() {
                return Err(MalformedResourceName::new(
                    raw,
                    "empty name or digest around '@'",
                ));
            }
            Ok((name.to_string(), digest.to_string()))
        }
        (_, None, _) => Err(MalformedResourceName::new(raw, "missing '@' separator")),
        _ => Err(MalformedResourceName::new(raw, "more than one '@' separator")),
    }
}
