//! Request harness server.
//!
//! ```text
//!     Client Request
//!     ─────────────────▶ http server ──▶ routing::Router ──▶ handler
//!                          │   ▲                │               │
//!                          │   │                ▼               ▼
//!                          │   └──────── encoder ◀──────── Reply / HandlerFault
//!                          │                    │
//!                          ▼                    ▼
//!                    /_harness/*        diagnostics log (one record per request)
//! ```

use std::path::PathBuf;

use clap::Parser;

use request_harness::config::{load_config, HarnessConfig};
use request_harness::lifecycle::{signals, startup};
use request_harness::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "request-harness")]
#[command(about = "HTTP request harness with a diagnostics log", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => HarnessConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "request-harness starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_body_bytes = config.listener.max_body_bytes,
        request_timeout_secs = config.timeouts.request_secs,
        resources = config.resources.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let harness = startup::start(config).await?;
    tracing::info!(address = %harness.addr, "Listening for connections");

    signals::spawn_signal_listener(harness.shutdown.clone());
    harness.wait().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
