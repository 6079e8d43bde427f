//! Book storage subsystem.
//!
//! # Data Flow
//! ```text
//! handler
//!     → BookStore trait (injected as Arc<dyn BookStore>)
//!     → sqlite.rs (acquire pooled connection, run statements, commit)
//!     → Book row or StoreError
//!     → mapped to an HTTP status once, in http/response.rs
//! ```
//!
//! # Design Decisions
//! - One pooled connection per call, held by a guard that returns it to the
//!   pool on drop (success, business error, or failure alike)
//! - Business outcomes (duplicate title, missing id) are error variants, not panics
//! - Title uniqueness is checked before insert and enforced again by the
//!   UNIQUE constraint, so racing inserts still surface as `Duplicate`

pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use sqlite::SqliteBookStore;

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
}

/// Fields required to register a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
}

/// Errors returned by the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A book with this title already exists.
    #[error("Book with title '{0}' already registered")]
    Duplicate(String),

    /// No book has this id.
    #[error("Book with ID {0} not found")]
    NotFound(i64),

    /// The database rejected or failed the operation.
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    /// The database answered, but not in a shape we can use.
    #[error("unexpected storage failure: {0}")]
    Unexpected(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Decode(_)
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::TypeNotFound { .. } => StoreError::Unexpected(err.to_string()),
            other => StoreError::Database(other),
        }
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for the book catalog.
#[async_trait]
pub trait BookStore: Send + Sync + std::fmt::Debug {
    /// Insert a book with a title not yet in the catalog and return its id.
    async fn add_book(&self, book: &NewBook) -> StoreResult<i64>;

    /// Fetch a book by id.
    async fn get_book(&self, id: i64) -> StoreResult<Book>;

    /// Round-trip a trivial statement to prove the database is reachable.
    async fn ping(&self) -> StoreResult<()>;
}
