//! # secretdrop
//!
//! Backend secret store for a Telegram Mini App. Secrets (a piece of text or
//! a Telegram file reference) live under unguessable keys; holding a key is
//! the only thing needed to read its secret. A single configured admin can
//! list and delete secrets.
//!
//! ## Architecture
//!
//! ```text
//! HTTP (axum) → auth guards → SecretService → SecretStore (memory | postgres)
//!      ↓                                              ↓
//!  rate limiting                               view log per secret
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use secretdrop::{api::start_api_server, config::AppConfig, services::SecretService, storage};
//!
//! #[tokio::main]
//! async fn main() -> secretdrop::Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let store = storage::create_store(&config.storage).await?;
//!     let service = Arc::new(SecretService::new(store, config.admin.max_secret_bytes));
//!     start_api_server(&config, service).await
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod services;
pub mod storage;

// Re-export commonly used types and traits
pub use config::AppConfig;
pub use errors::{Result, SecretDropError};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
