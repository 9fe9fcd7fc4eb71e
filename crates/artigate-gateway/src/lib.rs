//! Artigate Gateway
//!
//! HTTP front end that serves registry-hosted chart artifacts under stable
//! names.
//!
//! # Overview
//!
//! Two resolution strategies share one server bootstrap:
//! - **Index**: `GET /{name}@{digest}` and `GET /{name}:{tag}` resolve against
//!   an [`AssetIndex`](artigate_core::AssetIndex) built once at startup, then
//!   authenticate, pull and return the artifact as an attachment
//! - **Metadata**: `GET /{asset}` forwards to the backend image metadata API
//!   and returns its JSON document
//!
//! Both also serve `GET /health`. The index strategy lists its contents at
//! `GET /assets`.
//!
//! # Architecture
//!
//! ```text
//!   client ──► GatewayServer ──► ResolutionStrategy
//!                  │                 ├── IndexStrategy ──► PullProxy ──► OCI registry
//!                  │                 └── MetadataStrategy ──► metadata API
//!                  └── /health, request log, graceful shutdown
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use artigate_gateway::{GatewayConfig, GatewayServer, IndexStrategy, PullProxy};
//!
//! let config = GatewayConfig::builder()
//!     .project("acme")
//!     .repository("charts")
//!     .credential_path("/secrets/key.json")
//!     .build()?;
//! let proxy = PullProxy::new(puller, &config.credential_path);
//! let strategy = IndexStrategy::build(&listing, proxy).await?;
//! GatewayServer::from_config(&config).run(strategy).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

pub mod config;
pub mod error;
pub mod metadata;
pub mod pull;
pub mod router;
pub mod server;

pub use config::{parse_auths, AuthPair, GatewayConfig, GatewayConfigBuilder};
pub use error::{GatewayError, Result};
pub use metadata::{AuthPolicy, MetadataStrategy};
pub use pull::PullProxy;
pub use router::{IndexStrategy, Resolution};
pub use server::{shutdown_signal, GatewayServer, ResolutionStrategy, REQUEST_ID_HEADER};
