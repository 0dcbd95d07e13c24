//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Create the diagnostics log and the route table, once
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is returned before the listener binds
//! - Each configured resource gets its own in-memory store

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::validation::validate_config;
use crate::config::{ConfigError, HarnessConfig};
use crate::diagnostics::Diagnostics;
use crate::handler::Resource;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::routing::{RouteError, Router, RouterBuilder};
use crate::store::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("route table error: {0}")]
    Route(#[from] RouteError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A running harness server.
#[derive(Debug)]
pub struct Harness {
    pub addr: SocketAddr,
    pub router: Arc<Router>,
    pub diagnostics: Arc<Diagnostics>,
    pub shutdown: Shutdown,
    task: JoinHandle<Result<(), std::io::Error>>,
}

impl Harness {
    /// Base URL of the listener, e.g. `http://127.0.0.1:3000`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Trigger shutdown and wait for in-flight requests to drain.
    pub async fn stop(self) -> Result<(), StartupError> {
        self.shutdown.trigger();
        self.wait().await
    }

    /// Wait for the server task to finish.
    pub async fn wait(self) -> Result<(), StartupError> {
        match self.task.await {
            Ok(result) => Ok(result?),
            Err(e) => Err(StartupError::Io(std::io::Error::other(e))),
        }
    }
}

/// Build the route table for every configured resource.
pub fn build_router(
    config: &HarnessConfig,
    diagnostics: Arc<Diagnostics>,
) -> Result<Router, RouteError> {
    build_router_with(config, Router::builder(), diagnostics)
}

/// Like [`build_router`], mounting the resources after routes already on `builder`.
pub fn build_router_with(
    config: &HarnessConfig,
    mut builder: RouterBuilder,
    diagnostics: Arc<Diagnostics>,
) -> Result<Router, RouteError> {
    for resource in &config.resources {
        let store = Arc::new(MemoryStore::new());
        builder = Resource::new(resource, store).mount(builder);
        tracing::debug!(resource = %resource.name, "Resource mounted");
    }
    builder.build(diagnostics)
}

/// Start a harness serving the configured resources.
pub async fn start(config: HarnessConfig) -> Result<Harness, StartupError> {
    start_with(config, Router::builder()).await
}

/// Start a harness serving `builder`'s routes plus the configured resources.
pub async fn start_with(
    config: HarnessConfig,
    builder: RouterBuilder,
) -> Result<Harness, StartupError> {
    validate_config(&config).map_err(ConfigError::Validation)?;

    let diagnostics = Arc::new(Diagnostics::new(config.diagnostics.log_records));
    let router = Arc::new(build_router_with(&config, builder, diagnostics.clone())?);

    tracing::info!(
        routes = router.routes().len(),
        resources = config.resources.len(),
        "Route table built"
    );

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;
    let addr = listener.local_addr()?;

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, router.clone());
    let task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    Ok(Harness {
        addr,
        router,
        diagnostics,
        shutdown,
        task,
    })
}
