//! Server bootstrap shared by every resolution strategy.
//!
//! A gateway is a [`ResolutionStrategy`] mounted next to a health route and a
//! request logger, served until a shutdown signal arrives. In-flight requests
//! get a bounded grace period to finish; new connections are refused as soon
//! as the signal fires.

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::error::Result;

/// Header carrying the per-request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// How a gateway maps request paths onto backend lookups.
pub trait ResolutionStrategy: Send + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Routes served by this strategy, with state already attached.
    fn routes(self) -> Router;
}

/// Listener address and shutdown policy of a gateway.
#[derive(Debug, Clone)]
pub struct GatewayServer {
    bind: String,
    grace: Duration,
}

impl GatewayServer {
    /// Creates a server bound to `bind` (`host:port`).
    pub fn new(bind: impl Into<String>, grace: Duration) -> Self {
        Self {
            bind: bind.into(),
            grace,
        }
    }

    /// Creates a server from gateway configuration.
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.listen.clone(), config.shutdown_grace)
    }

    /// Assembles the full application router for `strategy`.
    pub fn router<S: ResolutionStrategy>(strategy: S) -> Router {
        Router::new()
            .route("/health", get(|| async { "ok" }))
            .merge(strategy.routes())
            .layer(middleware::from_fn(log_request))
    }

    /// Binds the listener.
    pub async fn bind(&self) -> Result<TcpListener> {
        let listener = TcpListener::bind(&self.bind).await?;
        tracing::info!(addr = %listener.local_addr()?, "listening");
        Ok(listener)
    }

    /// Serves `strategy` on `listener` until `shutdown` resolves.
    ///
    /// After `shutdown` resolves no new connections are accepted. Requests
    /// already in flight are awaited for at most the grace period.
    pub async fn serve<S, F>(&self, listener: TcpListener, strategy: S, shutdown: F) -> Result<()>
    where
        S: ResolutionStrategy,
        F: Future<Output = ()> + Send + 'static,
    {
        let name = strategy.name();
        let app = Self::router(strategy);

        let draining = Arc::new(Notify::new());
        let signalled = Arc::clone(&draining);
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("shutdown requested, draining in-flight requests");
            signalled.notify_one();
        });

        let grace = self.grace;
        let deadline = async move {
            draining.notified().await;
            tokio::time::sleep(grace).await;
        };

        tracing::info!(strategy = name, grace_secs = grace.as_secs(), "gateway started");
        tokio::select! {
            result = server.into_future() => result?,
            () = deadline => {
                tracing::warn!(grace_secs = grace.as_secs(), "grace period elapsed, abandoning in-flight requests");
            }
        }
        tracing::info!(strategy = name, "gateway stopped");
        Ok(())
    }

    /// Binds and serves until SIGINT or SIGTERM.
    pub async fn run<S: ResolutionStrategy>(&self, strategy: S) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener, strategy, shutdown_signal()).await
    }
}

/// Resolves on SIGINT (ctrl-c) or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

async fn log_request(mut request: Request, next: Next) -> Response {
    let id = Uuid::now_v7().to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let header = HeaderValue::from_str(&id).ok();
    if let Some(value) = &header {
        request.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }

    let mut response = next.run(request).await;
    if let Some(value) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    tracing::info!(
        request_id = %id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis(),
        "request completed"
    );
    response
}
