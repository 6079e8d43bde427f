//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (RPS, latency, errors, storage health)
//! - Expose Prometheus-compatible metrics endpoint
//! - Record per-route request samples
//!
//! # Metrics
//! - `book_service_requests_total` (counter): requests by method, route, status
//! - `book_service_request_duration_seconds` (histogram): latency distribution
//! - `book_service_errors_total` (counter): mapped errors by kind
//! - `book_service_books_created_total` (counter): successful inserts
//! - `book_service_db_up` (gauge): 1=reachable, 0=unreachable, set by `/health`
//!
//! # Design Decisions
//! - Low-overhead metric updates through the `metrics` facade
//! - Routes are labelled by template (`/books/{book_id}`), never raw paths
//! - Histogram buckets cover the 1–5 s `/slow` range

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "book_service_requests_total";
pub const REQUEST_DURATION: &str = "book_service_request_duration_seconds";
pub const ERRORS_TOTAL: &str = "book_service_errors_total";
pub const BOOKS_CREATED_TOTAL: &str = "book_service_books_created_total";
pub const DB_UP: &str = "book_service_db_up";

const LATENCY_BUCKETS: [f64; 12] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 3.0, 5.0, 10.0,
];

/// Install the global recorder and serve `/metrics` on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), &LATENCY_BUCKETS)?
        .install()?;

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a completed request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!(
        REQUEST_DURATION,
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record an error mapped at the HTTP boundary.
pub fn record_error(kind: &'static str) {
    metrics::counter!(ERRORS_TOTAL, "kind" => kind).increment(1);
}

pub fn record_book_created() {
    metrics::counter!(BOOKS_CREATED_TOTAL).increment(1);
}

pub fn record_db_up(up: bool) {
    metrics::gauge!(DB_UP).set(if up { 1.0 } else { 0.0 });
}

/// Middleware recording one sample per routed request.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    record_request(&method, &route, response.status().as_u16(), start);
    response
}
