//! Manual migration runner for PostgreSQL
//!
//! Connects to the configured database and applies all pending migrations.
//! Usage: cargo run --bin run_migrations
//!
//! Reads DATABASE_URL (default postgresql://localhost/secretdrop).

use secretdrop::{config::DatabaseConfig, storage::create_pool};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    let _ = dotenvy::dotenv();

    let db_config = DatabaseConfig {
        max_connections: 2,
        auto_migrate: false,
        ..DatabaseConfig::from_env()
    };

    let pool = create_pool(&db_config).await?;
    info!("Connected to database");

    secretdrop::storage::run_migrations(&pool).await?;

    let tables = sqlx::query_scalar::<_, String>(
        "SELECT tablename FROM pg_tables WHERE schemaname = 'public' ORDER BY tablename",
    )
    .fetch_all(&pool)
    .await?;
    info!("Tables in database: {:?}", tables);

    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(&pool)
        .await?;
    info!("Migrations applied: {}", count);

    Ok(())
}
