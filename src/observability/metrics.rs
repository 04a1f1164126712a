//! # Metrics Collection
//!
//! Counters for secret operations. The `metrics` macros are no-ops until a
//! recorder is installed, so handlers record unconditionally and only
//! [`init_metrics`] decides whether anything is exported.

use crate::config::ObservabilityConfig;
use crate::domain::SecretKind;
use crate::errors::{AuthErrorType, Result, SecretDropError};
use ::tracing::{info, warn};
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Start the Prometheus exporter if metrics are enabled
pub fn init_metrics(config: &ObservabilityConfig) -> Result<()> {
    if !config.enable_metrics {
        return Ok(());
    }

    let metrics_addr = match config.metrics_bind_address() {
        Some(addr) => addr,
        None => {
            warn!("Metrics disabled: no bind address configured");
            return Ok(());
        }
    };

    let socket_addr: SocketAddr = metrics_addr.parse().map_err(|e| {
        SecretDropError::config(format!("Invalid metrics bind address '{}': {}", metrics_addr, e))
    })?;

    PrometheusBuilder::new()
        .with_http_listener(socket_addr)
        .add_global_label("service", &config.service_name)
        .install()
        .map_err(|e| {
            SecretDropError::config(format!("Failed to initialize metrics exporter: {}", e))
        })?;

    describe_metrics();

    info!(metrics_addr = %metrics_addr, service_name = %config.service_name, "Metrics collection initialized");
    Ok(())
}

fn describe_metrics() {
    describe_counter!("secret_fetches_total", "Secret lookups by outcome (hit/miss)");
    describe_counter!("secrets_created_total", "Secrets ingested by type");
    describe_counter!("secrets_deleted_total", "Admin deletions by whether the key existed");
    describe_counter!("admin_auth_denied_total", "Rejected admin or ingest requests by reason");
    describe_counter!("secret_fetch_rate_limited_total", "Fetches rejected by the rate limiter");
}

pub fn record_secret_fetch(found: bool) {
    let outcome = if found { "hit" } else { "miss" };
    counter!("secret_fetches_total", "outcome" => outcome).increment(1);
}

pub fn record_secret_created(kind: SecretKind) {
    counter!("secrets_created_total", "type" => kind.as_str()).increment(1);
}

pub fn record_secret_deleted(existed: bool) {
    let existed = if existed { "true" } else { "false" };
    counter!("secrets_deleted_total", "existed" => existed).increment(1);
}

pub fn record_auth_denied(reason: AuthErrorType) {
    counter!("admin_auth_denied_total", "reason" => reason.to_string()).increment(1);
}

pub fn record_rate_limited() {
    counter!("secret_fetch_rate_limited_total").increment(1);
}
