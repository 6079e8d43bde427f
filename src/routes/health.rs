use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;
use crate::observability::metrics;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    pub database: String,
}

/// Readiness probe: the service is healthy when storage answers a ping.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    match state.store.ping().await {
        Ok(()) => {
            metrics::record_db_up(true);
            tracing::debug!("Health check passed");
            (
                StatusCode::OK,
                Json(HealthStatus {
                    status: "healthy".into(),
                    database: "connected".into(),
                }),
            )
        }
        Err(e) => {
            metrics::record_db_up(false);
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthStatus {
                    status: "unhealthy".into(),
                    database: "disconnected".into(),
                }),
            )
        }
    }
}
