//! Configuration management for the library server
//!
//! This module handles loading and validating configuration from environment variables,
//! with support for different environments (development, staging, production).

use std::env;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Get the environment name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Which entity store backs the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

impl StorageBackend {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid storage backend: '{}'. Expected: postgres or memory",
                s
            ))),
        }
    }
}

pub const DEFAULT_JWT_SECRET: &str = "development-secret-change-in-production";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Current environment
    pub environment: Environment,

    /// Entity store implementation
    pub storage_backend: StorageBackend,

    /// Database connection URL (required for the Postgres backend)
    pub database_url: Option<String>,

    /// Maximum database connections
    pub db_max_connections: u32,

    /// Server port
    pub port: u16,

    /// JWT secret for token signing
    pub jwt_secret: String,

    /// Access token TTL in seconds (default: 300 = 5 minutes)
    pub jwt_access_token_ttl_seconds: i64,

    /// Refresh token TTL in days (default: 1)
    pub jwt_refresh_token_ttl_days: i64,

    /// bcrypt work factor for password hashes
    pub password_hash_cost: u32,

    /// Number of items per page on list endpoints
    pub page_size: u32,

    /// Rate limit: requests per second per client
    pub rate_limit_rps: u32,

    /// CORS allowed origins
    pub cors_allowed_origins: Option<String>,

    /// Log level (RUST_LOG)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .map(|s| Environment::parse(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let storage_backend = env::var("STORAGE_BACKEND")
            .map(|s| StorageBackend::parse(&s))
            .unwrap_or(Ok(StorageBackend::Postgres))?;

        let database_url = env::var("DATABASE_URL").ok();
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
        }

        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .unwrap_or(5);

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let jwt_secret =
            env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string());

        let jwt_access_token_ttl_seconds = env::var("JWT_ACCESS_TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "300".to_string())
            .parse::<i64>()
            .unwrap_or(300);

        let jwt_refresh_token_ttl_days = env::var("JWT_REFRESH_TOKEN_TTL_DAYS")
            .unwrap_or_else(|_| "1".to_string())
            .parse::<i64>()
            .unwrap_or(1);

        let password_hash_cost = match env::var("PASSWORD_HASH_COST") {
            Ok(raw) => {
                let cost = raw.parse::<u32>().map_err(|_| {
                    ConfigError::InvalidValue(format!("PASSWORD_HASH_COST: '{}'", raw))
                })?;
                if !(4..=31).contains(&cost) {
                    return Err(ConfigError::InvalidValue(
                        "PASSWORD_HASH_COST must be between 4 and 31".to_string(),
                    ));
                }
                cost
            }
            Err(_) => bcrypt::DEFAULT_COST,
        };

        let page_size = env::var("PAGE_SIZE")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()
            .ok()
            .filter(|size| *size > 0)
            .unwrap_or(10);

        let rate_limit_rps = env::var("RATE_LIMIT_RPS")
            .unwrap_or_else(|_| "100".to_string())
            .parse::<u32>()
            .unwrap_or(100);

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS").ok();

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            environment,
            storage_backend,
            database_url,
            db_max_connections,
            port,
            jwt_secret,
            jwt_access_token_ttl_seconds,
            jwt_refresh_token_ttl_days,
            password_hash_cost,
            page_size,
            rate_limit_rps,
            cors_allowed_origins,
            log_level,
        })
    }

    /// Whether the signing key is still the built-in development secret
    pub fn uses_default_jwt_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }

    /// Get database URL with the password masked, for logging
    pub fn database_url_masked(&self) -> String {
        let Some(url) = self.database_url.as_deref() else {
            return "<none>".to_string();
        };
        if let Some(at_pos) = url.find('@') {
            if let Some(colon_pos) = url[..at_pos].rfind(':') {
                // The scheme separator is not a password separator
                if url[..colon_pos].contains("//") {
                    return format!("{}****{}", &url[..colon_pos + 1], &url[at_pos..]);
                }
            }
        }
        url.to_string()
    }
}
