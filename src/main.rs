//! Book Service
//!
//! A small book catalog plus deliberately failing endpoints, used to
//! exercise log-based alerting and APM dashboards.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request-id → trace span → timeout → body limit → catch-panic
//!                                                                       │
//!                                                                       ▼
//!                                                          routes (demo / books / health)
//!                                                                       │
//!                                                                       ▼
//!                                                          store (Arc<dyn BookStore>)
//!                                                                       │
//!                                                                       ▼
//!                                                               SQLite connection pool
//!
//!     Cross-cutting: config (TOML + env + flags), tracing, Prometheus metrics,
//!                    graceful shutdown on SIGINT/SIGTERM
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use book_service::config::ServiceConfig;
use book_service::http::HttpServer;
use book_service::lifecycle::{open_store, resolve_config, Overrides, Shutdown};
use book_service::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "book-service")]
#[command(about = "Book catalog service with failure endpoints for alert testing", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen address
    #[arg(long)]
    bind: Option<String>,

    /// Override the database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let overrides = Overrides {
        bind_address: args.bind,
        database_url: args.database_url,
    };
    let config: ServiceConfig = resolve_config(args.config.as_deref(), &overrides)?;

    logging::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        service = %config.apm.service_name,
        apm_server = %config.apm.server_url,
        "book-service starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        database_url = %config.database.url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let store = open_store(&config.database).await.map_err(|e| {
        tracing::error!(error = %e, "Database initialization failed");
        e
    })?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config, Arc::new(store.clone()));
    server.run(listener, shutdown.subscribe()).await?;

    store.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
