//! # Storage and Persistence
//!
//! The secret store is an injected abstraction: handlers and services only
//! see [`SecretStore`]. Two backends exist, an in-process `dashmap` store and
//! a PostgreSQL store on `sqlx`.

pub mod memory;
pub mod migrations;
pub mod pool;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

pub use crate::config::DatabaseConfig;
pub use memory::InMemorySecretStore;
pub use migrations::run_migrations;
pub use pool::{create_pool, DbPool};
pub use postgres::PostgresSecretStore;

use crate::config::{StorageBackend, StorageConfig};
use crate::domain::{SecretKey, SecretRecord, SecretSummary, ViewEntry};
use crate::errors::Result;

/// Durable map from key to secret record.
///
/// Implementations must be safe for concurrent use: reads never block each
/// other and concurrent [`append_viewer`](SecretStore::append_viewer) calls
/// on the same key must all be recorded.
#[async_trait]
pub trait SecretStore: Send + Sync + std::fmt::Debug {
    /// Fetch a record by key. The view log is not loaded.
    async fn get(&self, key: &SecretKey) -> Result<Option<SecretRecord>>;

    /// Insert a new record. Fails with `Conflict` if the key is taken.
    async fn put(&self, record: SecretRecord) -> Result<()>;

    /// Remove a record and its view log. Returns whether it existed.
    async fn delete(&self, key: &SecretKey) -> Result<bool>;

    /// Summaries of every live record, oldest first
    async fn list(&self) -> Result<Vec<SecretSummary>>;

    /// Record a read. Fails with `NotFound` if the key is absent.
    async fn append_viewer(&self, key: &SecretKey, entry: ViewEntry) -> Result<()>;

    /// The view log of a record, or `None` if the key is absent
    async fn view_log(&self, key: &SecretKey) -> Result<Option<Vec<ViewEntry>>>;

    /// Short backend identifier for logs and health output
    fn backend_name(&self) -> &'static str;

    /// Check that the backend can serve requests
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Build the configured store, connecting and migrating the database when needed
pub async fn create_store(config: &StorageConfig) -> Result<Arc<dyn SecretStore>> {
    match config.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory secret store; secrets will not survive a restart");
            Ok(Arc::new(InMemorySecretStore::new()))
        }
        StorageBackend::Postgres => {
            let pool = create_pool(&config.database).await?;
            Ok(Arc::new(PostgresSecretStore::new(pool)))
        }
    }
}
