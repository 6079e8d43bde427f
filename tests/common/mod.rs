//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use book_service::config::ServiceConfig;
use book_service::http::HttpServer;
use book_service::lifecycle::Shutdown;
use book_service::store::SqliteBookStore;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A book service running on an ephemeral local port.
pub struct TestService {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestService {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Config with sub-second `/slow` and no Prometheus listener.
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.demo.slow_min_secs = 0.0;
    config.demo.slow_max_secs = 0.05;
    config.observability.metrics_enabled = false;
    config
}

/// Start a server backed by a fresh in-memory store.
pub async fn start_service(config: ServiceConfig) -> TestService {
    let store = SqliteBookStore::in_memory().await.unwrap();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, Arc::new(store));
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestService {
        addr,
        shutdown,
        handle,
    }
}
