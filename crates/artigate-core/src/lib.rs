//! # Artigate Core
//!
//! Core types for the Artigate artifact gateway.
//!
//! This crate provides the data structures shared by the gateway and the
//! backend clients:
//!
//! - [`Asset`] - One indexed artifact (image or chart) with its tags
//! - [`AssetIndex`] - Immutable, ordered index built once from a listing
//! - [`AssetListing`] - Paginated source the index is built from
//! - [`RepositoryPath`] - Project/location/repository coordinate
//! - [`parse_resource_name`] - Splits a backend identifier into name and digest
//!
//! ## Example
//!
//! ```rust
//! use artigate_core::{AssetIndex, ListedArtifact};
//!
//! let index = AssetIndex::from_records(vec![
//!     ListedArtifact::new(
//!         "projects/p/locations/l/repositories/r/dockerImages/web@sha256:1",
//!         "l-docker.pkg.dev/p/r/web@sha256:1",
//!     )
//!     .with_tag("latest"),
//! ])?;
//!
//! let asset = index.lookup_by_tag("web", "latest").expect("tagged");
//! assert_eq!(asset.digest, "sha256:1");
//! # Ok::<(), artigate_core::IndexError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod asset;
pub mod error;
pub mod index;
pub mod listing;


pub use asset::{Asset, RepositoryPath};
pub use error::{IndexError, MalformedResourceName, Result};
pub use index::{parse_resource_name, AssetIndex};
pub use listing::{AssetListing, BoxError, ListedArtifact, ListingPage};
