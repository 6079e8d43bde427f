//! Request tracing support.
//!
//! # Responsibilities
//! - Open one span per request carrying the correlation ID
//! - Tag spans with the APM service identity
//! - Log request completion with latency
//!
//! # Design Decisions
//! - The request ID is assigned before the span opens, so every log line
//!   inside a handler carries it
//! - 5xx responses are logged at ERROR by the trace layer itself, which is
//!   what the log-based alert rules key on

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse, MakeSpan, TraceLayer};
use tower_http::LatencyUnit;
use tracing::{Level, Span};

use crate::config::ApmConfig;
use crate::http::request::request_id;

/// Builds the per-request span.
#[derive(Debug, Clone)]
pub struct RequestSpan {
    service_name: Arc<str>,
    environment: Option<Arc<str>>,
}

impl RequestSpan {
    pub fn new(apm: &ApmConfig) -> Self {
        Self {
            service_name: Arc::from(apm.service_name.as_str()),
            environment: apm.environment.as_deref().map(Arc::from),
        }
    }
}

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let client = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string());

        tracing::info_span!(
            "request",
            service.name = %self.service_name,
            service.environment = self.environment.as_deref(),
            request_id = %request_id(request),
            method = %request.method(),
            path = %request.uri().path(),
            client.address = client.as_deref(),
        )
    }
}

/// Trace layer type used by the HTTP server.
pub type RequestTraceLayer =
    TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpan, (), DefaultOnResponse, (), (), DefaultOnFailure>;

/// Trace layer logging one line per response.
pub fn trace_layer(apm: &ApmConfig) -> RequestTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(RequestSpan::new(apm))
        .on_request(())
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
        .on_body_chunk(())
        .on_eos(())
        .on_failure(
            DefaultOnFailure::new()
                .level(Level::ERROR)
                .latency_unit(LatencyUnit::Millis),
        )
}
