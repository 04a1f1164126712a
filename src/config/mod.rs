//! # Configuration Management
//!
//! Environment-driven configuration for the secretdrop service.

pub mod settings;

pub use settings::{
    AdminConfig, ApiServerConfig, AppConfig, DatabaseConfig, ObservabilityConfig, StorageBackend,
    StorageConfig,
};
