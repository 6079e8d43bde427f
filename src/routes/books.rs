//! Book catalog endpoints.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::http::request::json_object;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::store::{Book, NewBook};

/// Body of a successful `POST /books`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookCreated {
    pub message: String,
    pub id: i64,
}

pub async fn add_book(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<BookCreated>), ApiError> {
    let Some(book) = json_object(&body)?.as_ref().and_then(new_book_from) else {
        tracing::error!("Invalid book data: missing title or author");
        return Err(ApiError::Validation("Missing title or author".into()));
    };

    let id = state.store.add_book(&book).await.map_err(|e| {
        tracing::error!(title = %book.title, error = %e, "Add book failed");
        ApiError::from(e)
    })?;

    tracing::info!(book_id = id, title = %book.title, "Book added");
    metrics::record_book_created();
    Ok((
        StatusCode::CREATED,
        Json(BookCreated {
            message: "Book added".into(),
            id,
        }),
    ))
}

pub async fn get_book(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Book>, ApiError> {
    let id = parse_book_id(&raw_id).map_err(|e| {
        tracing::error!(book_id = %raw_id, "Get book failed: invalid id");
        e
    })?;

    let book = state.store.get_book(id).await.map_err(|e| {
        tracing::error!(book_id = id, error = %e, "Get book failed");
        ApiError::from(e)
    })?;

    tracing::info!(book_id = id, title = %book.title, "Book fetched");
    Ok(Json(book))
}

/// Both fields must be present as JSON strings.
fn new_book_from(payload: &Map<String, Value>) -> Option<NewBook> {
    let title = payload.get("title")?.as_str()?;
    let author = payload.get("author")?.as_str()?;
    Some(NewBook {
        title: title.to_string(),
        author: author.to_string(),
    })
}

/// Positive integer id; surrounding whitespace is tolerated.
fn parse_book_id(raw: &str) -> Result<i64, ApiError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::Validation(format!("Invalid book ID: {}", raw))),
    }
}
