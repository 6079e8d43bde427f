//! Route table.
//!
//! | Method & Path         | Handler                  |
//! |-----------------------|--------------------------|
//! | `GET /`               | [`demo::home`]           |
//! | `GET /success`        | [`demo::success`]        |
//! | `POST /bad-request`   | [`demo::bad_request`]    |
//! | `GET /error`          | [`demo::error`]          |
//! | `GET /slow`           | [`demo::slow`]           |
//! | `GET /generate-error` | [`demo::generate_error`] |
//! | `GET /random`         | [`demo::random`]         |
//! | `POST /books`         | [`books::add_book`]      |
//! | `GET /books/{id}`     | [`books::get_book`]      |
//! | `GET /health`         | [`health::health`]       |

pub mod books;
pub mod demo;
pub mod health;

use axum::{
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::http::response::ApiError;
use crate::http::server::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/", get(demo::home))
        .route("/success", get(demo::success))
        .route("/bad-request", post(demo::bad_request))
        .route("/error", get(demo::error))
        .route("/slow", get(demo::slow))
        .route("/generate-error", get(demo::generate_error))
        .route("/random", get(demo::random))
        .route("/books", post(books::add_book))
        .route("/books/{book_id}", get(books::get_book))
        .route("/health", get(health::health))
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
