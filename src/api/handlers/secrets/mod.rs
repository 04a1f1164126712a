//! Public secret endpoints
//!
//! `GET /api/secret/{key}` is unauthenticated: the key itself is the
//! capability. `POST /api/secrets` is the ingestion path used by the bot and
//! sits behind the ingest token guard.

pub mod types;

pub use types::{CreateSecretRequest, CreateSecretResponse, FetchSecretQuery, SecretResponse};

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::{error::ApiError, routes::ApiState},
    domain::TelegramIdentity,
};

pub async fn get_secret_handler(
    State(state): State<ApiState>,
    Path(key): Path<String>,
    query: Result<Query<FetchSecretQuery>, QueryRejection>,
) -> Result<Json<SecretResponse>, ApiError> {
    // A garbled query string only loses the viewer id
    let query = query.map(|Query(query)| query).unwrap_or_default();
    let viewer = TelegramIdentity::from_query(query.viewer_id.as_deref());

    let record = state.service.fetch(&key, viewer).await?;
    Ok(Json(SecretResponse::from(record)))
}

pub async fn create_secret_handler(
    State(state): State<ApiState>,
    payload: Result<Json<CreateSecretRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateSecretResponse>), ApiError> {
    let Json(request) = payload?;

    let record = state.service.create(request.payload, request.uploader_id).await?;
    Ok((StatusCode::CREATED, Json(CreateSecretResponse::from(&record))))
}
