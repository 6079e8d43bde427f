//! SQLite-backed book store.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Connection, SqliteConnection};

use crate::config::DatabaseConfig;
use crate::store::{Book, BookStore, NewBook, StoreError, StoreResult};

const CREATE_BOOKS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS books (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL UNIQUE,
        author TEXT NOT NULL
    )
"#;

/// Book store over a SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqliteBookStore {
    pool: SqlitePool,
}

impl SqliteBookStore {
    /// Open a pool for the configured database URL.
    ///
    /// In-memory databases are pinned to a single long-lived connection so the
    /// data outlives individual requests. File databases run in WAL mode and
    /// wait up to `acquire_timeout_secs` on a locked database.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let wait = Duration::from_secs(config.acquire_timeout_secs);
        let in_memory = is_in_memory(&config.url);

        let mut options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .busy_timeout(wait);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let mut pool_options = SqlitePoolOptions::new().acquire_timeout(wait);
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(config.max_connections)
        };

        let pool = pool_options.connect_with(options).await?;
        tracing::debug!(
            url = %config.url,
            in_memory,
            max_connections = config.max_connections,
            "Database pool ready"
        );
        Ok(Self { pool })
    }

    /// Fresh private in-memory database, mostly for tests and demos.
    pub async fn in_memory() -> StoreResult<Self> {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        };
        let store = Self::connect(&config).await?;
        store.init_schema().await?;
        Ok(store)
    }

    /// Create the `books` table if it does not exist yet.
    pub async fn init_schema(&self) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;
        sqlx::query(CREATE_BOOKS_TABLE).execute(&mut *tx).await?;
        tx.commit().await?;
        tracing::info!("Database schema initialized");
        Ok(())
    }

    /// Underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every connection; later calls fail with a database error.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Insert without the pre-check. A UNIQUE violation still maps to `Duplicate`.
async fn insert_book(conn: &mut SqliteConnection, book: &NewBook) -> StoreResult<i64> {
    let result = sqlx::query("INSERT INTO books (title, author) VALUES (?, ?)")
        .bind(&book.title)
        .bind(&book.author)
        .execute(conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::Duplicate(book.title.clone())
            }
            other => StoreError::from(other),
        })?;

    let id = result.last_insert_rowid();
    if id <= 0 {
        return Err(StoreError::Unexpected(format!("insert returned row id {}", id)));
    }
    Ok(id)
}

/// `:memory:` paths and `mode=memory` URLs both name a private database per
/// connection.
fn is_in_memory(url: &str) -> bool {
    if url.contains(":memory:") {
        return true;
    }
    Url::parse(url)
        .map(|parsed| parsed.query_pairs().any(|(k, v)| k == "mode" && v == "memory"))
        .unwrap_or(false)
}

#[async_trait]
impl BookStore for SqliteBookStore {
    async fn add_book(&self, book: &NewBook) -> StoreResult<i64> {
        // Returned to the pool when `conn` drops.
        let mut conn = self.pool.acquire().await?;

        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM books WHERE title = ?")
            .bind(&book.title)
            .fetch_optional(&mut *conn)
            .await?;
        if existing.is_some() {
            return Err(StoreError::Duplicate(book.title.clone()));
        }

        // The transaction opens with the write, so SQLite takes the write lock
        // through the busy handler instead of upgrading a read lock. A racing
        // insert of the same title lands on the UNIQUE constraint.
        let mut tx = conn.begin().await?;
        let id = insert_book(&mut *tx, book).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn get_book(&self, id: i64) -> StoreResult<Book> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query_as::<_, Book>("SELECT id, title, author FROM books WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("SELECT 1").execute(&mut *conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_book(title: &str, author: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: author.to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_then_get() {
        let store = SqliteBookStore::in_memory().await.unwrap();

        let id = store.add_book(&new_book("Dune", "Herbert")).await.unwrap();
        assert_eq!(id, 1);

        let book = store.get_book(id).await.unwrap();
        assert_eq!(
            book,
            Book {
                id: 1,
                title: "Dune".into(),
                author: "Herbert".into()
            }
        );
    }

    #[tokio::test]
    async fn test_ids_increase() {
        let store = SqliteBookStore::in_memory().await.unwrap();
        let a = store.add_book(&new_book("A", "x")).await.unwrap();
        let b = store.add_book(&new_book("B", "x")).await.unwrap();
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_duplicate_title_rejected() {
        let store = SqliteBookStore::in_memory().await.unwrap();
        store.add_book(&new_book("Dune", "Herbert")).await.unwrap();

        let err = store.add_book(&new_book("Dune", "Someone Else")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(ref t) if t == "Dune"));

        // The failed attempt must not leave a second row behind.
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_unique_constraint_maps_to_duplicate() {
        let store = SqliteBookStore::in_memory().await.unwrap();
        let mut conn = store.pool().acquire().await.unwrap();

        insert_book(&mut conn, &new_book("Dune", "Herbert")).await.unwrap();
        let err = insert_book(&mut conn, &new_book("Dune", "Herbert")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_missing_book() {
        let store = SqliteBookStore::in_memory().await.unwrap();
        let err = store.get_book(99).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(99)));
    }

    #[tokio::test]
    async fn test_connections_released_after_errors() {
        let store = SqliteBookStore::in_memory().await.unwrap();
        store.add_book(&new_book("Dune", "Herbert")).await.unwrap();

        // The pool holds a single connection; each failing call must give it back.
        for _ in 0..5 {
            assert!(store.add_book(&new_book("Dune", "Herbert")).await.is_err());
            assert!(store.get_book(1000).await.is_err());
        }
        assert_eq!(store.get_book(1).await.unwrap().title, "Dune");
    }

    #[tokio::test]
    async fn test_closed_pool_is_database_error() {
        let store = SqliteBookStore::in_memory().await.unwrap();
        assert!(store.ping().await.is_ok());

        store.close().await;
        assert!(matches!(store.ping().await, Err(StoreError::Database(_))));
        assert!(matches!(store.get_book(1).await, Err(StoreError::Database(_))));
    }

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let store = SqliteBookStore::in_memory().await.unwrap();
        store.add_book(&new_book("Dune", "Herbert")).await.unwrap();
        store.init_schema().await.unwrap();
        assert_eq!(store.get_book(1).await.unwrap().author, "Herbert");
    }
    #[test]
    fn test_in_memory_detection() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file?mode=memory"));
        assert!(is_in_memory("sqlite://books.db?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://books.db?mode=rwc"));
        assert!(!is_in_memory("sqlite:///var/lib/books/books.db"));
    }

    #[tokio::test]
    async fn test_mode_memory_url_keeps_data_across_calls() {
        let config = DatabaseConfig {
            url: "sqlite://catalog?mode=memory".to_string(),
            ..DatabaseConfig::default()
        };
        let store = SqliteBookStore::connect(&config).await.unwrap();
        store.init_schema().await.unwrap();

        let id = store.add_book(&new_book("Dune", "Herbert")).await.unwrap();
        assert_eq!(store.get_book(id).await.unwrap().title, "Dune");
        assert_eq!(store.pool().options().get_max_connections(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("books.db").display()),
            max_connections: 5,
            ..DatabaseConfig::default()
        };
        let store = SqliteBookStore::connect(&config).await.unwrap();
        store.init_schema().await.unwrap();

        let mut distinct = Vec::new();
        for i in 0..40 {
            let store = store.clone();
            distinct.push(tokio::spawn(async move {
                store.add_book(&new_book(&format!("Book {}", i), "Anon")).await
            }));
        }
        let mut same = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            same.push(tokio::spawn(async move {
                store.add_book(&new_book("Dune", "Herbert")).await
            }));
        }

        for handle in distinct {
            let id = handle.await.unwrap().unwrap();
            assert!(id > 0);
        }

        let (mut added, mut duplicates) = (0, 0);
        for handle in same {
            match handle.await.unwrap() {
                Ok(_) => added += 1,
                Err(StoreError::Duplicate(_)) => duplicates += 1,
                Err(other) => panic!("racing insert failed: {}", other),
            }
        }
        assert_eq!((added, duplicates), (1, 9));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 41);
        store.close().await;
    }
}
