use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_path: PathBuf,

    // Web Server
    pub web_host: String,
    pub web_port: u16,

    // Admin
    pub admin_key: String,

    // Post listing
    pub post_list_limit: i64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Database
            database_path: PathBuf::from(env_or_default("DATABASE_PATH", "./data/forum.sqlite")),

            // Web Server
            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 8080)?,

            // Admin: the delete credential is injected, never a source literal
            admin_key: required_env("ADMIN_KEY")?,

            // Post listing
            post_list_limit: parse_env_i64("POST_LIST_LIMIT", 20)?,
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admin_key.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "ADMIN_KEY".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.post_list_limit < 1 {
            return Err(ConfigError::InvalidValue {
                name: "POST_LIST_LIMIT".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.parse().map_err(|source| ConfigError::ParseInt {
            name: name.to_string(),
            source,
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_i64(name: &str, default: i64) -> Result<i64, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.parse().map_err(|source| ConfigError::ParseInt {
            name: name.to_string(),
            source,
        }),
        Err(_) => Ok(default),
    }
}
