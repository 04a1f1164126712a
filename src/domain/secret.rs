//! Secret records
//!
//! A secret is either a piece of text or a Telegram file reference. The
//! payload is a tagged enum so a record can never carry both `content` and
//! `fileId`, or neither.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{SecretKey, TelegramIdentity};
use crate::errors::{Result, SecretDropError};

/// Longest accepted Telegram file id
pub const MAX_FILE_ID_LEN: usize = 256;

/// Secret type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretKind {
    Text,
    File,
}

impl SecretKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::File => "file",
        }
    }
}

impl fmt::Display for SecretKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecretKind {
    type Err = SecretDropError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "file" => Ok(Self::File),
            other => Err(SecretDropError::validation_field(
                format!("Unknown secret type '{}'", other),
                "type",
            )),
        }
    }
}

/// Secret payload, serialized as `{"type":"text","content":..}` or
/// `{"type":"file","fileId":..}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SecretPayload {
    Text {
        content: String,
    },
    File {
        #[serde(rename = "fileId")]
        file_id: String,
    },
}

impl SecretPayload {
    pub fn kind(&self) -> SecretKind {
        match self {
            Self::Text { .. } => SecretKind::Text,
            Self::File { .. } => SecretKind::File,
        }
    }

    /// Rebuild a payload from its stored columns. Exactly one of `content`
    /// and `file_id` must be present and it must match `kind`.
    pub fn from_parts(
        kind: SecretKind,
        content: Option<String>,
        file_id: Option<String>,
    ) -> Result<Self> {
        match (kind, content, file_id) {
            (SecretKind::Text, Some(content), None) => Ok(Self::Text { content }),
            (SecretKind::File, None, Some(file_id)) => Ok(Self::File { file_id }),
            (kind, content, file_id) => Err(SecretDropError::internal(format!(
                "Stored {} secret has inconsistent payload columns (content: {}, file_id: {})",
                kind,
                content.is_some(),
                file_id.is_some()
            ))),
        }
    }

    /// Validate a payload supplied for ingestion
    pub fn validate(&self, max_text_bytes: usize) -> Result<()> {
        match self {
            Self::Text { content } => {
                if content.trim().is_empty() {
                    return Err(SecretDropError::validation_field(
                        "content must not be empty",
                        "content",
                    ));
                }
                if content.len() > max_text_bytes {
                    return Err(SecretDropError::validation_field(
                        format!("content exceeds {} bytes", max_text_bytes),
                        "content",
                    ));
                }
            }
            Self::File { file_id } => {
                if file_id.trim().is_empty() {
                    return Err(SecretDropError::validation_field(
                        "fileId must not be empty",
                        "fileId",
                    ));
                }
                if file_id.len() > MAX_FILE_ID_LEN {
                    return Err(SecretDropError::validation_field(
                        format!("fileId exceeds {} characters", MAX_FILE_ID_LEN),
                        "fileId",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// One read of a secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewEntry {
    pub viewer: TelegramIdentity,
    pub viewed_at: DateTime<Utc>,
}

impl ViewEntry {
    pub fn now(viewer: TelegramIdentity) -> Self {
        Self { viewer, viewed_at: Utc::now() }
    }
}

/// A stored secret. The view log is kept apart from the record and is
/// only read through [`SecretStore::view_log`](crate::storage::SecretStore::view_log).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRecord {
    pub key: SecretKey,
    pub payload: SecretPayload,
    pub uploader: TelegramIdentity,
    pub created_at: DateTime<Utc>,
}

impl SecretRecord {
    /// New record created now. The creation time is truncated to
    /// milliseconds, the precision exposed on the wire.
    pub fn new(key: SecretKey, payload: SecretPayload, uploader: TelegramIdentity) -> Self {
        Self { key, payload, uploader, created_at: Utc::now().trunc_subsecs(3) }
    }

    pub fn kind(&self) -> SecretKind {
        self.payload.kind()
    }

    pub fn summary(&self, view_count: u64) -> SecretSummary {
        SecretSummary { key: self.key.clone(), kind: self.kind(), created_at: self.created_at, view_count }
    }
}

/// Listing entry: everything but the payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretSummary {
    pub key: SecretKey,
    pub kind: SecretKind,
    pub created_at: DateTime<Utc>,
    pub view_count: u64,
}
