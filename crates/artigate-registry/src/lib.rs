//! # Artigate Registry
//!
//! Backend clients used by the Artigate gateway.
//!
//! This crate talks to two remote services and one local resource:
//!
//! - **Artifact listing**: paginated `dockerImages` listing and single-image
//!   metadata lookups against the Artifact Registry REST API
//! - **OCI registry**: per-request login handshake and chart pull using the
//!   OCI Distribution API
//! - **Credentials**: the local secret file used for basic authentication
//!
//! The gateway depends only on the [`ArtifactPuller`] and [`ImageMetadata`]
//! traits (plus [`artigate_core::AssetListing`]), so tests can swap in
//! in-memory backends.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use artigate_registry::{read_credential, ArtifactPuller, OciClient, RegistryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OciClient::new(RegistryConfig::default())?;
//!     let uri = "us-central1-docker.pkg.dev/acme/charts/web@sha256:9f86d0";
//!
//!     let credential = read_credential("/secrets/key.json").await?;
//!     let session = client.login(uri, &credential).await?;
//!     let chart = client.pull(&session, uri).await?;
//!
//!     println!("{}", chart.file_name());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────┐   ┌─────────────────────────────┐
//! │   ArtifactRegistryClient    │   │          OciClient          │
//! │  (listing + image lookup)   │   │   (login + manifest/blob)   │
//! └──────────────┬──────────────┘   └──────────────┬──────────────┘
//!                ▼                                 ▼
//!     artifactregistry.googleapis.com      {region}-docker.pkg.dev/v2
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod client;
mod config;
mod credentials;
mod error;
mod listing;
mod oci;
mod reference;

#[cfg(test)]
mod backend_tests;

pub use client::{ArtifactPuller, OciClient, PulledArtifact, Session};
pub use config::{ListingConfig, RegistryAuth, RegistryConfig, TlsConfig};
pub use credentials::{read_credential, Credential, JSON_KEY_PRINCIPAL};
pub use error::RegistryError;
pub use listing::{ArtifactRegistryClient, ImageMetadata};
pub use oci::{ChartMeta, Descriptor, Manifest, MediaType};
pub use reference::Reference;
