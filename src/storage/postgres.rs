//! PostgreSQL secret store
//!
//! Records live in `secrets`; reads are logged in `secret_views`, which
//! cascades on delete so removing a secret also erases who saw it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::instrument;

use super::{DbPool, SecretStore};
use crate::domain::{
    SecretKey, SecretKind, SecretPayload, SecretRecord, SecretSummary, TelegramIdentity,
    ViewEntry,
};
use crate::errors::{Result, SecretDropError};

/// Database row structure for secrets
#[derive(Debug, Clone, FromRow)]
struct SecretRow {
    key: String,
    kind: String,
    content: Option<String>,
    file_id: Option<String>,
    uploader_id: Option<i64>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct SummaryRow {
    key: String,
    kind: String,
    created_at: DateTime<Utc>,
    view_count: i64,
}

#[derive(Debug, Clone, FromRow)]
struct ViewRow {
    viewer_id: Option<i64>,
    viewed_at: DateTime<Utc>,
}

impl SecretRow {
    fn into_record(self) -> Result<SecretRecord> {
        let kind: SecretKind = self.kind.parse().map_err(|_| {
            SecretDropError::internal(format!("Stored secret has unknown kind '{}'", self.kind))
        })?;
        let payload = SecretPayload::from_parts(kind, self.content, self.file_id)?;
        Ok(SecretRecord {
            key: SecretKey::from_string(self.key),
            payload,
            uploader: TelegramIdentity::from_db(self.uploader_id),
            created_at: self.created_at,
        })
    }
}

impl TryFrom<SummaryRow> for SecretSummary {
    type Error = SecretDropError;

    fn try_from(row: SummaryRow) -> Result<Self> {
        let kind: SecretKind = row.kind.parse().map_err(|_| {
            SecretDropError::internal(format!("Stored secret has unknown kind '{}'", row.kind))
        })?;
        Ok(SecretSummary {
            key: SecretKey::from_string(row.key),
            kind,
            created_at: row.created_at,
            view_count: row.view_count.max(0) as u64,
        })
    }
}

impl From<ViewRow> for ViewEntry {
    fn from(row: ViewRow) -> Self {
        ViewEntry { viewer: TelegramIdentity::from_db(row.viewer_id), viewed_at: row.viewed_at }
    }
}

fn payload_columns(payload: &SecretPayload) -> (Option<&str>, Option<&str>) {
    match payload {
        SecretPayload::Text { content } => (Some(content.as_str()), None),
        SecretPayload::File { file_id } => (None, Some(file_id.as_str())),
    }
}

/// Repository for secret data access
#[derive(Debug, Clone)]
pub struct PostgresSecretStore {
    pool: DbPool,
}

impl PostgresSecretStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_views(&self, key: &SecretKey) -> Result<Vec<ViewEntry>> {
        let rows = sqlx::query_as::<sqlx::Postgres, ViewRow>(
            "SELECT viewer_id, viewed_at FROM secret_views WHERE secret_key = $1 ORDER BY id",
        )
        .bind(key.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, key = %key.redacted(), "Failed to load view log");
            SecretDropError::database(e, "Failed to load secret view log")
        })?;

        Ok(rows.into_iter().map(ViewEntry::from).collect())
    }
}

#[async_trait]
impl SecretStore for PostgresSecretStore {
    #[instrument(skip(self), fields(key = %key.redacted()), name = "db_get_secret")]
    async fn get(&self, key: &SecretKey) -> Result<Option<SecretRecord>> {
        let row = sqlx::query_as::<sqlx::Postgres, SecretRow>(
            "SELECT key, kind, content, file_id, uploader_id, created_at FROM secrets WHERE key = $1",
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, key = %key.redacted(), "Failed to get secret");
            SecretDropError::database(e, "Failed to get secret")
        })?;

        row.map(SecretRow::into_record).transpose()
    }

    #[instrument(skip(self, record), fields(key = %record.key.redacted(), kind = %record.kind()), name = "db_put_secret")]
    async fn put(&self, record: SecretRecord) -> Result<()> {
        let (content, file_id) = payload_columns(&record.payload);

        sqlx::query(
            "INSERT INTO secrets (key, kind, content, file_id, uploader_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.key.as_str())
        .bind(record.kind().as_str())
        .bind(content)
        .bind(file_id)
        .bind(record.uploader.as_db())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
                return SecretDropError::conflict(
                    format!("Secret key '{}' already exists", record.key.redacted()),
                    "secret",
                );
            }
            tracing::error!(error = %e, key = %record.key.redacted(), "Failed to insert secret");
            SecretDropError::database(e, "Failed to insert secret")
        })?;

        tracing::info!(key = %record.key.redacted(), kind = %record.kind(), "Stored new secret");
        Ok(())
    }

    #[instrument(skip(self), fields(key = %key.redacted()), name = "db_delete_secret")]
    async fn delete(&self, key: &SecretKey) -> Result<bool> {
        let result = sqlx::query("DELETE FROM secrets WHERE key = $1")
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, key = %key.redacted(), "Failed to delete secret");
                SecretDropError::database(e, "Failed to delete secret")
            })?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), name = "db_list_secrets")]
    async fn list(&self) -> Result<Vec<SecretSummary>> {
        let rows = sqlx::query_as::<sqlx::Postgres, SummaryRow>(
            "SELECT s.key, s.kind, s.created_at, COUNT(v.id) AS view_count \
             FROM secrets s LEFT JOIN secret_views v ON v.secret_key = s.key \
             GROUP BY s.key, s.kind, s.created_at \
             ORDER BY s.created_at, s.key",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list secrets");
            SecretDropError::database(e, "Failed to list secrets")
        })?;

        rows.into_iter().map(SecretSummary::try_from).collect()
    }

    async fn append_viewer(&self, key: &SecretKey, entry: ViewEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO secret_views (secret_key, viewer_id, viewed_at) VALUES ($1, $2, $3)",
        )
        .bind(key.as_str())
        .bind(entry.viewer.as_db())
        .bind(entry.viewed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error().is_some_and(|db| db.is_foreign_key_violation()) {
                return SecretDropError::not_found("secret", key.redacted());
            }
            SecretDropError::database(e, "Failed to record secret view")
        })?;

        Ok(())
    }

    async fn view_log(&self, key: &SecretKey) -> Result<Option<Vec<ViewEntry>>> {
        let exists = sqlx::query_scalar::<sqlx::Postgres, bool>(
            "SELECT EXISTS (SELECT 1 FROM secrets WHERE key = $1)",
        )
        .bind(key.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| SecretDropError::database(e, "Failed to check secret existence"))?;

        if !exists {
            return Ok(None);
        }
        self.fetch_views(key).await.map(Some)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| SecretDropError::database(e, "Database connectivity check failed"))?;
        Ok(())
    }
}
