//! Admin endpoints. Requests only reach these handlers after
//! [`require_admin`](crate::auth::require_admin) has verified the caller.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::{
    api::{error::ApiError, routes::ApiState},
    auth::AdminContext,
    domain::{SecretKind, SecretSummary, TelegramIdentity, ViewEntry},
};

/// Listing entry. Payloads are never part of the listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretSummaryResponse {
    #[serde(rename = "type")]
    pub kind: SecretKind,
    /// Creation time, epoch milliseconds
    pub timestamp: i64,
    pub view_count: u64,
}

impl From<&SecretSummary> for SecretSummaryResponse {
    fn from(summary: &SecretSummary) -> Self {
        Self {
            kind: summary.kind,
            timestamp: summary.created_at.timestamp_millis(),
            view_count: summary.view_count,
        }
    }
}

/// `{ key: {type, timestamp, viewCount} }`
pub type SecretListResponse = BTreeMap<String, SecretSummaryResponse>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResponse {
    pub viewer_id: TelegramIdentity,
    /// Epoch milliseconds
    pub viewed_at: i64,
}

impl From<ViewEntry> for ViewResponse {
    fn from(entry: ViewEntry) -> Self {
        Self { viewer_id: entry.viewer, viewed_at: entry.viewed_at.timestamp_millis() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SecretViewsResponse {
    pub key: String,
    pub views: Vec<ViewResponse>,
}

#[instrument(skip(state, context), fields(admin_id = context.telegram_id))]
pub async fn list_secrets_handler(
    State(state): State<ApiState>,
    Extension(context): Extension<AdminContext>,
) -> Result<Json<SecretListResponse>, ApiError> {
    let summaries = state.service.list().await?;

    let listing = summaries
        .iter()
        .map(|summary| (summary.key.as_str().to_string(), SecretSummaryResponse::from(summary)))
        .collect();

    Ok(Json(listing))
}

#[instrument(skip(state, context, key), fields(admin_id = context.telegram_id))]
pub async fn delete_secret_handler(
    State(state): State<ApiState>,
    Extension(context): Extension<AdminContext>,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
    let existed = state.service.delete(&key).await?;
    info!(existed, "Admin delete");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, context, key), fields(admin_id = context.telegram_id))]
pub async fn secret_views_handler(
    State(state): State<ApiState>,
    Extension(context): Extension<AdminContext>,
    Path(key): Path<String>,
) -> Result<Json<SecretViewsResponse>, ApiError> {
    let views = state.service.views(&key).await?;

    Ok(Json(SecretViewsResponse {
        key,
        views: views.into_iter().map(ViewResponse::from).collect(),
    }))
}
