use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use secretdrop::{
    api::start_api_server,
    config::AppConfig,
    observability::{init_observability, log_config_info},
    services::SecretService,
    storage::create_store,
    APP_NAME, VERSION,
};
use tracing::info;

/// Secret store backend for the secretdrop Telegram Mini App
#[derive(Debug, Parser)]
#[command(name = "secretdrop", version, about)]
struct Args {
    /// Load environment variables from this file instead of `./.env`
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Validate configuration and exit
    #[arg(long)]
    check_config: bool,
}

fn load_env_file(path: Option<&PathBuf>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load env file {}", path.display()))?;
        }
        None => {
            // A missing ./.env is normal
            if let Err(e) = dotenvy::dotenv() {
                if !e.not_found() {
                    eprintln!("Warning: Error loading .env file: {}", e);
                }
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Must happen before any config is read from the environment
    load_env_file(args.env_file.as_ref())?;

    let config = AppConfig::from_env().context("invalid configuration")?;

    if args.check_config {
        println!("Configuration OK (storage backend: {})", config.storage.backend);
        return Ok(());
    }

    init_observability(&config.observability).context("failed to initialize observability")?;
    info!(app_name = APP_NAME, version = VERSION, "Starting secretdrop");
    log_config_info(&config);

    let store = create_store(&config.storage).await.context("failed to initialize secret store")?;
    info!(storage_backend = store.backend_name(), "Secret store ready");

    let service = Arc::new(SecretService::new(store, config.admin.max_secret_bytes));

    start_api_server(&config, service).await.context("API server terminated with error")?;

    info!("secretdrop stopped");
    Ok(())
}
