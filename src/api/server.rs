use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    errors::{Result, SecretDropError},
    services::SecretService,
};

use super::routes::build_router;

pub async fn start_api_server(config: &AppConfig, service: Arc<SecretService>) -> Result<()> {
    let addr: SocketAddr = config
        .api
        .socket_address()
        .parse()
        .map_err(|e| SecretDropError::config(format!("Invalid API address: {}", e)))?;

    let router = build_router(service, config);

    let listener = TcpListener::bind(addr).await.map_err(|e| SecretDropError::Io {
        source: e,
        context: format!("Failed to bind API server on {}", addr),
    })?;

    info!(address = %addr, "Starting HTTP API server");

    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "API server shutdown listener failed");
            }
        })
        .await
        .map_err(|e| SecretDropError::Io { source: e, context: "API server error".to_string() })?;

    info!("API server shutdown completed");
    Ok(())
}
