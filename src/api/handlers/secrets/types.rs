//! Request and response bodies for the secret endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::{SecretKind, SecretPayload, SecretRecord, TelegramIdentity};

/// Query string of `GET /api/secret/{key}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchSecretQuery {
    pub viewer_id: Option<String>,
}

/// Public projection of a secret: `{type, uploaderId, content | fileId}`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretResponse {
    #[serde(flatten)]
    pub payload: SecretPayload,
    pub uploader_id: TelegramIdentity,
}

impl From<SecretRecord> for SecretResponse {
    fn from(record: SecretRecord) -> Self {
        Self { payload: record.payload, uploader_id: record.uploader }
    }
}

/// Body of `POST /api/secrets`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSecretRequest {
    #[serde(flatten)]
    pub payload: SecretPayload,
    #[serde(default)]
    pub uploader_id: TelegramIdentity,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSecretResponse {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: SecretKind,
    /// Creation time, epoch milliseconds
    pub timestamp: i64,
}

impl From<&SecretRecord> for CreateSecretResponse {
    fn from(record: &SecretRecord) -> Self {
        Self {
            key: record.key.as_str().to_string(),
            kind: record.kind(),
            timestamp: record.created_at.timestamp_millis(),
        }
    }
}
