//! In-memory secret store
//!
//! Backed by a sharded `DashMap`, so reads of different keys never contend
//! and a view append holds only its own shard's write lock.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::instrument;

use super::SecretStore;
use crate::domain::{SecretKey, SecretRecord, SecretSummary, ViewEntry};
use crate::errors::{Result, SecretDropError};

/// A record and its view log, stored side by side so reads of the record
/// never copy the log.
#[derive(Debug)]
struct StoredSecret {
    record: SecretRecord,
    views: Vec<ViewEntry>,
}

#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    secrets: DashMap<SecretKey, StoredSecret>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    #[instrument(skip(self), fields(key = %key.redacted()), name = "mem_get_secret")]
    async fn get(&self, key: &SecretKey) -> Result<Option<SecretRecord>> {
        Ok(self.secrets.get(key).map(|entry| entry.record.clone()))
    }

    #[instrument(skip(self, record), fields(key = %record.key.redacted()), name = "mem_put_secret")]
    async fn put(&self, record: SecretRecord) -> Result<()> {
        match self.secrets.entry(record.key.clone()) {
            Entry::Occupied(_) => Err(SecretDropError::conflict(
                format!("Secret key '{}' already exists", record.key.redacted()),
                "secret",
            )),
            Entry::Vacant(slot) => {
                slot.insert(StoredSecret { record, views: Vec::new() });
                Ok(())
            }
        }
    }

    #[instrument(skip(self), fields(key = %key.redacted()), name = "mem_delete_secret")]
    async fn delete(&self, key: &SecretKey) -> Result<bool> {
        Ok(self.secrets.remove(key).is_some())
    }

    async fn list(&self) -> Result<Vec<SecretSummary>> {
        let mut summaries: Vec<SecretSummary> = self
            .secrets
            .iter()
            .map(|entry| entry.record.summary(entry.views.len() as u64))
            .collect();
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.key.cmp(&b.key)));
        Ok(summaries)
    }

    async fn append_viewer(&self, key: &SecretKey, entry: ViewEntry) -> Result<()> {
        match self.secrets.get_mut(key) {
            Some(mut stored) => {
                stored.views.push(entry);
                Ok(())
            }
            None => Err(SecretDropError::not_found("secret", key.redacted())),
        }
    }

    async fn view_log(&self, key: &SecretKey) -> Result<Option<Vec<ViewEntry>>> {
        Ok(self.secrets.get(key).map(|stored| stored.views.clone()))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
