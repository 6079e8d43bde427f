//! Startup orchestration.
//!
//! # Responsibilities
//! - Layer configuration: defaults, optional TOML file, environment, flags
//! - Validate the result once, after every layer is applied
//! - Open the book store and make sure its schema exists
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when storage is ready)

use std::path::Path;

use crate::config::{apply_env_overrides, read_config, validate_config, ConfigError, DatabaseConfig, ServiceConfig};
use crate::store::{SqliteBookStore, StoreResult};

/// Command line overrides, applied after the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind_address: Option<String>,
    pub database_url: Option<String>,
}

/// Resolve the effective configuration from the process environment.
pub fn resolve_config(path: Option<&Path>, overrides: &Overrides) -> Result<ServiceConfig, ConfigError> {
    resolve_config_with(path, overrides, |key| std::env::var(key).ok())
}

/// Same as [`resolve_config`] with an explicit environment lookup.
pub fn resolve_config_with<F>(
    path: Option<&Path>,
    overrides: &Overrides,
    lookup: F,
) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => ServiceConfig::default(),
    };

    apply_env_overrides(&mut config, lookup)?;

    if let Some(addr) = &overrides.bind_address {
        config.listener.bind_address = addr.clone();
    }
    if let Some(url) = &overrides.database_url {
        config.database.url = url.clone();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Connect to the configured database and create the schema if needed.
pub async fn open_store(config: &DatabaseConfig) -> StoreResult<SqliteBookStore> {
    let store = SqliteBookStore::connect(config).await?;
    store.init_schema().await?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BookStore, NewBook};
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_file() {
        let config = resolve_config_with(None, &Overrides::default(), no_env).unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:5000");
        assert_eq!(config.apm.service_name, "book-service");
    }

    #[test]
    fn test_flags_beat_environment_and_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[listener]\nbind_address = \"127.0.0.1:7000\"").unwrap();

        let overrides = Overrides {
            bind_address: Some("127.0.0.1:9000".into()),
            database_url: None,
        };
        let env = |key: &str| match key {
            "BOOK_SERVICE_BIND_ADDRESS" => Some("127.0.0.1:8000".to_string()),
            "BOOK_SERVICE_DATABASE_URL" => Some("sqlite::memory:".to_string()),
            _ => None,
        };

        let config = resolve_config_with(Some(file.path()), &overrides, env).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.database.url, "sqlite::memory:");
    }

    #[test]
    fn test_validation_runs_after_overrides() {
        let overrides = Overrides {
            bind_address: Some("not an address".into()),
            database_url: None,
        };
        let err = resolve_config_with(None, &overrides, no_env).unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors[0].field, "listener.bind_address");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_open_store_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("books.db").display());
        let config = DatabaseConfig {
            url,
            ..DatabaseConfig::default()
        };

        let store = open_store(&config).await.unwrap();
        let id = store
            .add_book(&NewBook {
                title: "Dune".into(),
                author: "Herbert".into(),
            })
            .await
            .unwrap();
        store.close().await;

        let reopened = open_store(&config).await.unwrap();
        assert_eq!(reopened.get_book(id).await.unwrap().title, "Dune");
        reopened.close().await;
    }
}
