//! # Database Migration Management
//!
//! SQL migrations under `migrations/` are embedded into the binary at
//! compile time and applied on startup when `auto_migrate` is enabled.

use crate::errors::Result;
use crate::storage::DbPool;
use sqlx::migrate::Migrator;
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply all pending migrations
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    let available = MIGRATOR.iter().count();
    info!(available_migrations = available, "Running database migrations");

    MIGRATOR.run(pool).await?;

    info!("Database migrations completed");
    Ok(())
}
