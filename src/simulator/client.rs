//! HTTP client for the book service, one call per [`Operation`].

use std::fmt;
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde_json::json;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A single call the driver can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Home,
    Success,
    BadRequest,
    Error,
    Slow,
    GenerateError,
    Random,
    AddBook,
    /// Fetch a random id in `1..=max_id`.
    GetBook { max_id: i64 },
    Health,
}

impl Operation {
    /// Statuses that count as the service behaving as designed.
    pub fn expected_statuses(&self) -> &'static [u16] {
        match self {
            Operation::Home | Operation::Success | Operation::Slow => &[200],
            Operation::BadRequest => &[200, 400],
            Operation::Error | Operation::GenerateError => &[500],
            Operation::Random => &[200, 500],
            Operation::AddBook => &[201, 409, 500],
            Operation::GetBook { .. } => &[200, 404, 500],
            Operation::Health => &[200, 503],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Home => "home",
            Operation::Success => "success",
            Operation::BadRequest => "bad_request",
            Operation::Error => "error",
            Operation::Slow => "slow",
            Operation::GenerateError => "generate_error",
            Operation::Random => "random",
            Operation::AddBook => "add_book",
            Operation::GetBook { .. } => "get_book",
            Operation::Health => "health",
        }
    }

    pub fn is_expected(&self, status: StatusCode) -> bool {
        self.expected_statuses().contains(&status.as_u16())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct Probe {
    pub operation: Operation,
    pub status: StatusCode,
    pub latency: Duration,
    pub expected: bool,
}

/// Thin wrapper over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: Client,
    base_url: String,
}

impl ServiceClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /` answers 200.
    pub async fn check_connection(&self) -> bool {
        match self.http.get(self.url("/")).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                tracing::debug!(error = %e, url = %self.base_url, "Connection check failed");
                false
            }
        }
    }

    /// Issue the request for `operation` and classify the status.
    pub async fn execute(&self, operation: Operation) -> Result<Probe, reqwest::Error> {
        let request = match operation {
            Operation::Home => self.http.get(self.url("/")),
            Operation::Success => self.http.get(self.url("/success")),
            Operation::BadRequest => {
                let body = if fastrand::bool() {
                    json!({ "value": fastrand::u32(..1000) })
                } else {
                    json!({})
                };
                self.http.post(self.url("/bad-request")).json(&body)
            }
            Operation::Error => self.http.get(self.url("/error")),
            Operation::Slow => self.http.get(self.url("/slow")),
            Operation::GenerateError => self.http.get(self.url("/generate-error")),
            Operation::Random => self.http.get(self.url("/random")),
            Operation::AddBook => {
                let body = json!({
                    "title": format!("Book_{}", fastrand::u32(1000..100_000)),
                    "author": format!("Author_{}", fastrand::u32(100..1000)),
                });
                self.http.post(self.url("/books")).json(&body)
            }
            Operation::GetBook { max_id } => {
                let id = fastrand::i64(1..=max_id.max(1));
                self.http.get(self.url(&format!("/books/{}", id)))
            }
            Operation::Health => self.http.get(self.url("/health")),
        };

        let start = Instant::now();
        let response = request.send().await?;
        let latency = start.elapsed();
        let status = response.status();
        // Drain the body so the connection goes back to the pool.
        let _ = response.bytes().await;

        Ok(Probe {
            operation,
            status,
            latency,
            expected: operation.is_expected(status),
        })
    }
}
