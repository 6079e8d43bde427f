//! Configuration loading from disk and the environment.

use std::path::Path;
use std::fs;
use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables consulted by [`apply_env_overrides`].
pub const ENV_APM_SERVICE_NAME: &str = "ELASTIC_APM_SERVICE_NAME";
pub const ENV_APM_SERVER_URL: &str = "ELASTIC_APM_SERVER_URL";
pub const ENV_APM_ENVIRONMENT: &str = "ELASTIC_APM_ENVIRONMENT";
pub const ENV_DATABASE_URL: &str = "BOOK_SERVICE_DATABASE_URL";
pub const ENV_BIND_ADDRESS: &str = "BOOK_SERVICE_BIND_ADDRESS";
pub const ENV_LOG_FORMAT: &str = "BOOK_SERVICE_LOG_FORMAT";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, message: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, message } => write!(f, "Invalid {}: {}", var, message),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment variables on top of a loaded configuration.
///
/// `lookup` is usually `|key| std::env::var(key).ok()`.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(name) = lookup(ENV_APM_SERVICE_NAME) {
        config.apm.service_name = name;
    }
    if let Some(url) = lookup(ENV_APM_SERVER_URL) {
        config.apm.server_url = url;
    }
    if let Some(env) = lookup(ENV_APM_ENVIRONMENT) {
        config.apm.environment = Some(env);
    }
    if let Some(url) = lookup(ENV_DATABASE_URL) {
        config.database.url = url;
    }
    if let Some(addr) = lookup(ENV_BIND_ADDRESS) {
        config.listener.bind_address = addr;
    }
    if let Some(format) = lookup(ENV_LOG_FORMAT) {
        config.observability.log_format = format
            .parse()
            .map_err(|message| ConfigError::Env { var: ENV_LOG_FORMAT, message })?;
    }
    Ok(())
}
