//! Traffic-shaping endpoints: fixed successes, fixed failures, latency and
//! coin-flip failures. They exist to produce log lines and latency samples.

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    Json,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::DemoConfig;
use crate::http::request::json_object;
use crate::http::response::ApiError;
use crate::http::server::AppState;

/// `{"message": ...}` body.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub message: String,
}

impl Message {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct Echo {
    pub message: &'static str,
    pub value: Value,
}

pub async fn home() -> Json<Message> {
    tracing::info!("Home endpoint accessed");
    Message::new("Welcome to the Book Service")
}

pub async fn success() -> Json<Message> {
    tracing::info!("Success endpoint accessed");
    Message::new("Success")
}

pub async fn bad_request(body: Bytes) -> Result<Json<Echo>, ApiError> {
    let value = json_object(&body)?.and_then(|mut map| map.remove("value"));
    let Some(value) = value else {
        tracing::error!("Bad request: missing 'value' in JSON");
        return Err(ApiError::Validation("Missing 'value' in JSON".into()));
    };

    tracing::info!("Bad request endpoint accessed");
    Ok(Json(Echo {
        message: "Valid request",
        value,
    }))
}

pub async fn error() -> Result<Json<Message>, ApiError> {
    tracing::error!("Error endpoint accessed");
    Err(ApiError::Fault("This is a test error".into()))
}

pub async fn slow(State(state): State<AppState>) -> Json<Message> {
    let duration = slow_duration(&state.demo);
    tokio::time::sleep(duration).await;

    let secs = duration.as_secs_f64();
    tracing::info!(duration_secs = secs, "Slow endpoint accessed");
    Message::new(format!("Slow response after {:.2} seconds", secs))
}

pub async fn generate_error() -> (StatusCode, Json<Message>) {
    tracing::error!("Generated test error for alerting");
    (StatusCode::INTERNAL_SERVER_ERROR, Message::new("Error generated"))
}

pub async fn random(State(state): State<AppState>) -> Result<Json<Message>, ApiError> {
    if should_fail(state.demo.random_failure_rate) {
        tracing::error!("Random endpoint failed");
        return Err(ApiError::Fault("Random failure".into()));
    }
    tracing::info!("Random endpoint succeeded");
    Ok(Message::new("Random success"))
}

/// Uniform sample from `[slow_min_secs, slow_max_secs]`.
fn slow_duration(demo: &DemoConfig) -> Duration {
    let (min, max) = (demo.slow_min_secs.max(0.0), demo.slow_max_secs.max(0.0));
    let secs = if max > min {
        rand::thread_rng().gen_range(min..=max)
    } else {
        min
    };
    Duration::from_secs_f64(secs)
}

fn should_fail(rate: f64) -> bool {
    rand::thread_rng().gen_bool(rate.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slow_duration_within_bounds() {
        let demo = DemoConfig {
            slow_min_secs: 1.0,
            slow_max_secs: 5.0,
            ..DemoConfig::default()
        };
        for _ in 0..200 {
            let d = slow_duration(&demo).as_secs_f64();
            assert!((1.0..=5.0).contains(&d), "{}", d);
        }
    }

    #[test]
    fn test_slow_duration_degenerate_range() {
        let demo = DemoConfig {
            slow_min_secs: 0.25,
            slow_max_secs: 0.25,
            ..DemoConfig::default()
        };
        assert_eq!(slow_duration(&demo), Duration::from_millis(250));
    }

    #[test]
    fn test_should_fail_extremes() {
        assert!((0..100).all(|_| should_fail(1.0)));
        assert!((0..100).all(|_| !should_fail(0.0)));
    }
}
