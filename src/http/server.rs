//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (panic capture, request ID, tracing, limits, metrics)
//! - Bind server to listener
//! - Drain in-flight requests on shutdown
//!
//! # Layer Order (outermost first)
//! ```text
//! request-id → trace → propagate id → body limit → catch-panic
//!     → router → [per route: metrics → timeout] → handler
//! ```

use axum::{
    middleware,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
};

use crate::config::{DemoConfig, ServiceConfig};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::response::panic_response;
use crate::observability::{metrics, tracing::trace_layer};
use crate::routes;
use crate::store::BookStore;

/// Application state injected into handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: Arc<dyn BookStore>,
    pub demo: DemoConfig,
}

/// HTTP server for the book service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and storage.
    pub fn new(config: ServiceConfig, store: Arc<dyn BookStore>) -> Self {
        let state = AppState {
            store,
            demo: config.demo.clone(),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Request accounting wraps the timeout, so a request cut off with 408
    /// is still counted under its route template.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let per_route = ServiceBuilder::new()
            .layer(middleware::from_fn(metrics::track_requests))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        routes::api_router()
            .route_layer(per_route)
            .fallback(routes::not_found)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(trace_layer(&config.apm))
                    .layer(propagate_request_id_layer())
                    .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
                    // Innermost, so a panic still gets a logged, correlated 500.
                    .layer(CatchPanicLayer::custom(panic_response)),
            )
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            service = %self.config.apm.service_name,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    use crate::store::SqliteBookStore;

    async fn server(config: ServiceConfig) -> HttpServer {
        let store = SqliteBookStore::in_memory().await.unwrap();
        HttpServer::new(config, Arc::new(store))
    }

    #[tokio::test]
    async fn test_timed_out_request_is_counted() {
        let mut config = ServiceConfig::default();
        config.timeouts.request_secs = 1;
        config.demo.slow_min_secs = 2.0;
        config.demo.slow_max_secs = 2.0;
        let app = server(config).await.router();

        // Thread-local recorder; the current-thread runtime keeps everything here.
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let _guard = ::metrics::set_default_local_recorder(&recorder);

        let request = Request::builder().uri("/slow").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert!(response.headers().contains_key("x-request-id"));

        let rendered = handle.render();
        let line = rendered
            .lines()
            .find(|l| l.starts_with(metrics::REQUESTS_TOTAL) && l.contains("status=\"408\""))
            .unwrap_or_else(|| panic!("no 408 sample in:\n{}", rendered));
        assert!(line.contains("route=\"/slow\""), "{}", line);
        assert!(rendered.contains(metrics::REQUEST_DURATION));
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let mut config = ServiceConfig::default();
        config.limits.max_body_bytes = 16;
        let app = server(config).await.router();

        let body = r#"{"title": "A very long title", "author": "Someone"}"#;
        let request = Request::builder()
            .method("POST")
            .uri("/books")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(response.headers().contains_key("x-request-id"));
    }
}
