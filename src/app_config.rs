// Centralized configuration management for the funnel data layer
// Load ALL env vars ONCE at startup

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Global application configuration loaded once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    // For tests, load .env file first
    #[cfg(test)]
    dotenv::dotenv().ok();

    AppConfig::from_env().expect("Failed to load configuration")
});

/// Accessor used throughout the crate
pub fn config() -> &'static AppConfig {
    &CONFIG
}

/// Environment type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Environment {
    Development,
    Test,
    Staging,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" => Environment::Staging,
            "test" => Environment::Test,
            _ => Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Staging => "staging",
            Environment::Production => "production",
        };
        write!(f, "{}", s)
    }
}

/// Complete data-layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub rust_log: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_min_connections: u32,
    pub database_connect_timeout: u64,
    pub database_idle_timeout: u64,
    pub database_max_lifetime: u64,

    // Features
    pub disable_embedded_migrations: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Helper function to get required env var
        let get_required = |key: &str| -> Result<String, ConfigError> {
            env::var(key).map_err(|_| ConfigError::MissingVar(key.to_string()))
        };

        // Helper function to get optional env var with default
        let get_or_default = |key: &str, default: &str| -> String {
            env::var(key).unwrap_or_else(|_| default.to_string())
        };

        // Helper function to parse env var with default
        let parse_or_default = |key: &str, default: &str| -> Result<u32, ConfigError> {
            get_or_default(key, default).parse().map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "not a valid u32".to_string())
            })
        };

        let parse_u64_or_default = |key: &str, default: &str| -> Result<u64, ConfigError> {
            get_or_default(key, default).parse().map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "not a valid u64".to_string())
            })
        };

        let parse_bool_or_default = |key: &str, default: &str| -> bool {
            get_or_default(key, default).to_lowercase() == "true"
        };

        Ok(AppConfig {
            environment: Environment::from(get_or_default("ENVIRONMENT", "development")),
            rust_log: get_or_default("RUST_LOG", "info"),

            database_url: get_required("DATABASE_URL")?,
            database_max_connections: parse_or_default("DATABASE_MAX_CONNECTIONS", "20")?,
            database_min_connections: parse_or_default("DATABASE_MIN_CONNECTIONS", "2")?,
            database_connect_timeout: parse_u64_or_default("DATABASE_CONNECT_TIMEOUT", "10")?,
            database_idle_timeout: parse_u64_or_default("DATABASE_IDLE_TIMEOUT", "300")?,
            database_max_lifetime: parse_u64_or_default("DATABASE_MAX_LIFETIME", "1800")?,

            disable_embedded_migrations: parse_bool_or_default(
                "DISABLE_EMBEDDED_MIGRATIONS",
                "false",
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_from_string() {
        assert_eq!(
            Environment::from("production".to_string()),
            Environment::Production
        );
        assert_eq!(
            Environment::from("PROD".to_string()),
            Environment::Production
        );
        assert_eq!(
            Environment::from("staging".to_string()),
            Environment::Staging
        );
        assert_eq!(Environment::from("test".to_string()), Environment::Test);
        assert_eq!(
            Environment::from("anything-else".to_string()),
            Environment::Development
        );
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(Environment::Development.to_string(), "development");
        assert_eq!(Environment::Production.to_string(), "production");
    }
}
