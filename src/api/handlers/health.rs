//! Health check endpoint for monitoring and readiness probes

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::routes::ApiState;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` or `unavailable`
    pub status: String,
    /// Storage backend name
    pub storage: String,
}

/// Returns 200 when the secret store answers its health check, 503 otherwise.
/// Unauthenticated.
pub async fn health_handler(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    let store = state.service.store();
    let storage = store.backend_name().to_string();

    match store.health_check().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse { status: "ok".to_string(), storage })),
        Err(e) => {
            warn!(error = %e, storage = %storage, "Storage health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse { status: "unavailable".to_string(), storage }),
            )
        }
    }
}
