//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request produces:
//!     → tracing.rs (span with request ID and service identity)
//!     → logging.rs (structured log events, stdout + optional file)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log shipper tailing stdout / the log file (alert rules)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through all log lines of a request
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
pub mod tracing;
