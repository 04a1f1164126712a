//! # Structured Logging
//!
//! Sets up the `tracing` subscriber. `RUST_LOG` wins over the configured
//! level; JSON output includes the current span so request ids from the
//! HTTP trace layer end up on every line.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{AppConfig, ObservabilityConfig};
use crate::errors::{Result, SecretDropError};

/// Install the global subscriber
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| {
            SecretDropError::config(format!("Invalid log level '{}': {}", config.log_level, e))
        })?;

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json_logging {
        registry.with(fmt::layer().json().with_current_span(true).with_span_list(false)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| SecretDropError::config(format!("Failed to initialize logging: {}", e)))
}

/// Log configuration at startup
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        api_address = %config.api.socket_address(),
        storage_backend = %config.storage.backend,
        admin_configured = config.admin.telegram_id.is_some(),
        ingestion_enabled = config.admin.ingest_token.is_some(),
        fetch_rate_limit_per_minute = config.api.fetch_rate_limit_per_minute,
        trusted_proxy_depth = config.api.trusted_proxy_depth,
        metrics_enabled = config.observability.enable_metrics,
        json_logging = config.observability.json_logging,
        "secretdrop configuration"
    );
}
