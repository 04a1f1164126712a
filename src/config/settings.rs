//! # Configuration Settings
//!
//! Defines the configuration structure for the secretdrop service and
//! loads it from `SECRETDROP_*` / `DATABASE_*` environment variables.

use crate::errors::{Result, SecretDropError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    /// HTTP API configuration
    #[validate(nested)]
    pub api: ApiServerConfig,

    /// Admin identity and ingestion settings
    #[validate(nested)]
    pub admin: AdminConfig,

    /// Storage backend configuration
    #[validate(nested)]
    pub storage: StorageConfig,

    /// Logging and metrics configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Create configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            api: ApiServerConfig::from_lookup(&lookup)?,
            admin: AdminConfig::from_lookup(&lookup)?,
            storage: StorageConfig::from_lookup(&lookup)?,
            observability: ObservabilityConfig::from_lookup(&lookup)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(SecretDropError::from)?;
        self.validate_custom()
    }

    fn validate_custom(&self) -> Result<()> {
        if self.observability.enable_metrics && self.observability.metrics_port == self.api.port {
            return Err(SecretDropError::validation("API and metrics ports cannot be the same"));
        }

        if self.storage.backend == StorageBackend::Postgres
            && !self.storage.database.is_postgresql()
        {
            return Err(SecretDropError::validation(
                "Database URL must start with 'postgres://' or 'postgresql://'",
            ));
        }

        if let Some(token) = &self.admin.ingest_token {
            if token.len() < 16 {
                return Err(SecretDropError::validation_field(
                    "Ingest token must be at least 16 characters long",
                    "ingest_token",
                ));
            }
        }

        Ok(())
    }
}

/// HTTP API server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApiServerConfig {
    #[validate(length(min = 1, message = "Bind address cannot be empty"))]
    pub bind_address: String,

    #[validate(range(min = 1, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    pub timeout_seconds: u64,

    /// Maximum request body size in bytes
    #[validate(range(min = 1024, message = "Max body size must be at least 1KB"))]
    pub max_body_size: usize,

    /// CORS allowed origins (empty = allow all)
    pub cors_origins: Vec<String>,

    /// Fetches allowed per peer per minute (0 = unlimited)
    pub fetch_rate_limit_per_minute: u32,

    /// Header carrying the client address when running behind a proxy
    #[validate(length(min = 1, message = "Trusted proxy header cannot be empty"))]
    pub trusted_proxy_header: String,

    /// Number of trusted proxies in front of the server (0 = use the socket peer)
    #[validate(range(max = 16, message = "Trusted proxy depth must be at most 16"))]
    pub trusted_proxy_depth: usize,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            timeout_seconds: 30,
            max_body_size: 64 * 1024,
            cors_origins: vec![],
            fetch_rate_limit_per_minute: 60,
            trusted_proxy_header: "X-Forwarded-For".to_string(),
            trusted_proxy_depth: 0,
        }
    }
}

impl ApiServerConfig {
    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: &F) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            bind_address: lookup("SECRETDROP_API_BIND_ADDRESS").unwrap_or(defaults.bind_address),
            port: parse_var(lookup, "SECRETDROP_API_PORT", defaults.port)?,
            timeout_seconds: parse_var(
                lookup,
                "SECRETDROP_API_TIMEOUT_SECONDS",
                defaults.timeout_seconds,
            )?,
            max_body_size: parse_var(
                lookup,
                "SECRETDROP_API_MAX_BODY_SIZE",
                defaults.max_body_size,
            )?,
            cors_origins: lookup("SECRETDROP_CORS_ORIGINS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            fetch_rate_limit_per_minute: parse_var(
                lookup,
                "SECRETDROP_FETCH_RATE_LIMIT_PER_MINUTE",
                defaults.fetch_rate_limit_per_minute,
            )?,
            trusted_proxy_header: non_empty(lookup("SECRETDROP_TRUSTED_PROXY_HEADER"))
                .unwrap_or(defaults.trusted_proxy_header),
            trusted_proxy_depth: parse_var(
                lookup,
                "SECRETDROP_TRUSTED_PROXY_DEPTH",
                defaults.trusted_proxy_depth,
            )?,
        })
    }

    /// Get the server bind address
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Admin identity and ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdminConfig {
    /// Telegram user id allowed to list and delete secrets
    pub telegram_id: Option<i64>,

    /// Shared token required by the ingestion endpoint
    #[serde(skip_serializing)]
    pub ingest_token: Option<String>,

    /// Maximum accepted text secret length in bytes
    #[validate(range(min = 1, max = 1048576, message = "Max secret size must be 1B..1MB"))]
    pub max_secret_bytes: usize,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self { telegram_id: None, ingest_token: None, max_secret_bytes: 16 * 1024 }
    }
}

impl AdminConfig {
    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: &F) -> Result<Self> {
        let telegram_id = match non_empty(lookup("SECRETDROP_ADMIN_TELEGRAM_ID")) {
            Some(raw) => Some(raw.parse::<i64>().map_err(|e| {
                SecretDropError::config(format!("Invalid SECRETDROP_ADMIN_TELEGRAM_ID: {}", e))
            })?),
            None => None,
        };

        Ok(Self {
            telegram_id,
            ingest_token: non_empty(lookup("SECRETDROP_INGEST_TOKEN")),
            max_secret_bytes: parse_var(
                lookup,
                "SECRETDROP_MAX_SECRET_BYTES",
                Self::default().max_secret_bytes,
            )?,
        })
    }
}

/// Which [`crate::storage::SecretStore`] implementation to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = SecretDropError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(SecretDropError::config(format!(
                "Unknown storage backend '{}', expected 'memory' or 'postgres'",
                other
            ))),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Postgres => write!(f, "postgres"),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    #[validate(nested)]
    pub database: DatabaseConfig,
}

impl StorageConfig {
    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: &F) -> Result<Self> {
        let backend = match non_empty(lookup("SECRETDROP_STORAGE_BACKEND")) {
            Some(raw) => raw.parse()?,
            None => StorageBackend::default(),
        };
        Ok(Self { backend, database: DatabaseConfig::from_lookup(lookup) })
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[serde(skip_serializing)]
    #[validate(length(min = 1, message = "Database URL cannot be empty"))]
    pub url: String,

    /// Maximum number of connections in the pool
    #[validate(range(min = 1, max = 100, message = "Max connections must be between 1 and 100"))]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[validate(range(max = 50, message = "Min connections must be between 0 and 50"))]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[validate(range(
        min = 1,
        max = 60,
        message = "Connect timeout must be between 1 and 60 seconds"
    ))]
    pub connect_timeout_seconds: u64,

    /// Idle timeout in seconds (0 = no timeout)
    pub idle_timeout_seconds: u64,

    /// Enable automatic migrations
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/secretdrop".to_string(),
            max_connections: 10,
            min_connections: 0,
            connect_timeout_seconds: 10,
            idle_timeout_seconds: 600,
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Get idle timeout as Duration (None if 0)
    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.idle_timeout_seconds))
        }
    }

    /// Check if this is a PostgreSQL configuration
    pub fn is_postgresql(&self) -> bool {
        self.url.starts_with("postgresql://") || self.url.starts_with("postgres://")
    }

    /// Create DatabaseConfig from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(&|name: &str| std::env::var(name).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: &F) -> Self {
        let defaults = Self::default();

        let url = lookup("DATABASE_URL").unwrap_or(defaults.url);

        let max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.max_connections);

        let min_connections = lookup("DATABASE_MIN_CONNECTIONS")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.min_connections);

        let connect_timeout_seconds = lookup("DATABASE_CONNECT_TIMEOUT_SECONDS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.connect_timeout_seconds);

        let idle_timeout_seconds = lookup("DATABASE_IDLE_TIMEOUT_SECONDS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.idle_timeout_seconds);

        let auto_migrate = lookup("DATABASE_AUTO_MIGRATE")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(defaults.auto_migrate);

        Self {
            url,
            max_connections,
            min_connections,
            connect_timeout_seconds,
            idle_timeout_seconds,
            auto_migrate,
        }
    }
}

/// Logging and metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Service name attached to metrics
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Default log filter (trace, debug, info, warn, error) when RUST_LOG is unset
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,

    /// Enable the Prometheus exporter
    pub enable_metrics: bool,

    /// Prometheus exporter port
    pub metrics_port: u16,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "secretdrop".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
            enable_metrics: false,
            metrics_port: 9090,
        }
    }
}

impl ObservabilityConfig {
    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: &F) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            service_name: defaults.service_name,
            log_level: non_empty(lookup("SECRETDROP_LOG_LEVEL")).unwrap_or(defaults.log_level),
            json_logging: parse_flag(lookup("SECRETDROP_LOG_JSON"), defaults.json_logging),
            enable_metrics: parse_flag(
                lookup("SECRETDROP_ENABLE_METRICS"),
                defaults.enable_metrics,
            ),
            metrics_port: parse_var(lookup, "SECRETDROP_METRICS_PORT", defaults.metrics_port)?,
        })
    }

    /// Get metrics bind address (None if disabled)
    pub fn metrics_bind_address(&self) -> Option<String> {
        if !self.enable_metrics || self.metrics_port == 0 {
            None
        } else {
            Some(format!("0.0.0.0:{}", self.metrics_port))
        }
    }
}

fn parse_var<T, F>(lookup: &F, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup(name)) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| SecretDropError::config(format!("Invalid {}: {}", name, e))),
        None => Ok(default),
    }
}

fn parse_flag(raw: Option<String>, default: bool) -> bool {
    raw.map(|s| s.to_lowercase() == "true" || s == "1").unwrap_or(default)
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}
