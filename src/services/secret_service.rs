//! Secret business logic service
//!
//! Fetch, ingest, list and delete semantics on top of an injected
//! [`SecretStore`], separated from HTTP concerns. Authorization happens
//! before these methods are reached.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::{
    domain::{SecretKey, SecretPayload, SecretRecord, SecretSummary, TelegramIdentity, ViewEntry},
    errors::{Result, SecretDropError},
    observability::metrics,
    storage::SecretStore,
};

/// Attempts at finding an unused key before giving up
const KEY_GENERATION_ATTEMPTS: usize = 3;

/// Service for managing secret records
#[derive(Debug, Clone)]
pub struct SecretService {
    store: Arc<dyn SecretStore>,
    max_secret_bytes: usize,
}

impl SecretService {
    /// Create a new secret service
    pub fn new(store: Arc<dyn SecretStore>, max_secret_bytes: usize) -> Self {
        Self { store, max_secret_bytes }
    }

    pub fn store(&self) -> &Arc<dyn SecretStore> {
        &self.store
    }

    /// Look up a secret by its key and record who read it.
    ///
    /// Recording the viewer is best-effort: a failed append is logged and
    /// the secret is still returned.
    #[instrument(skip(self, raw_key, viewer), fields(viewer = %viewer))]
    pub async fn fetch(&self, raw_key: &str, viewer: TelegramIdentity) -> Result<SecretRecord> {
        let Some(key) = SecretKey::parse(raw_key) else {
            metrics::record_secret_fetch(false);
            return Err(SecretDropError::not_found("secret", "<malformed>"));
        };

        let Some(record) = self.store.get(&key).await? else {
            metrics::record_secret_fetch(false);
            debug!(key = %key.redacted(), "Secret not found");
            return Err(SecretDropError::not_found("secret", key.redacted()));
        };

        if let Err(e) = self.store.append_viewer(&key, ViewEntry::now(viewer)).await {
            warn!(error = %e, key = %key.redacted(), "Failed to record secret viewer");
        }

        metrics::record_secret_fetch(true);
        info!(key = %key.redacted(), kind = %record.kind(), "Secret fetched");
        Ok(record)
    }

    /// Store a new secret under a freshly generated key
    #[instrument(skip(self, payload, uploader), fields(kind = %payload.kind(), uploader = %uploader))]
    pub async fn create(
        &self,
        payload: SecretPayload,
        uploader: TelegramIdentity,
    ) -> Result<SecretRecord> {
        payload.validate(self.max_secret_bytes)?;

        for attempt in 1..=KEY_GENERATION_ATTEMPTS {
            let record = SecretRecord::new(SecretKey::generate(), payload.clone(), uploader);
            match self.store.put(record.clone()).await {
                Ok(()) => {
                    metrics::record_secret_created(record.kind());
                    info!(key = %record.key.redacted(), kind = %record.kind(), "Secret created");
                    return Ok(record);
                }
                Err(e) if e.is_conflict() => {
                    warn!(attempt, "Generated secret key collided, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(SecretDropError::internal("Could not allocate a unique secret key"))
    }

    /// Summaries of all live secrets
    pub async fn list(&self) -> Result<Vec<SecretSummary>> {
        let summaries = self.store.list().await?;
        debug!(count = summaries.len(), "Listed secrets");
        Ok(summaries)
    }

    /// Remove a secret. Deleting an absent key is not an error; the return
    /// value says whether anything was removed.
    #[instrument(skip(self, raw_key))]
    pub async fn delete(&self, raw_key: &str) -> Result<bool> {
        let Some(key) = SecretKey::parse(raw_key) else {
            return Ok(false);
        };

        let existed = self.store.delete(&key).await?;
        metrics::record_secret_deleted(existed);
        info!(key = %key.redacted(), existed, "Secret delete processed");
        Ok(existed)
    }

    /// Full view log of a secret
    pub async fn views(&self, raw_key: &str) -> Result<Vec<ViewEntry>> {
        let key = SecretKey::parse(raw_key)
            .ok_or_else(|| SecretDropError::not_found("secret", "<malformed>"))?;

        self.store
            .view_log(&key)
            .await?
            .ok_or_else(|| SecretDropError::not_found("secret", key.redacted()))
    }
}
