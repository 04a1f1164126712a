//! HTTP handlers for the secretdrop API.

pub mod admin;
pub mod health;
pub mod secrets;

pub use admin::{delete_secret_handler, list_secrets_handler, secret_views_handler};
pub use health::health_handler;
pub use secrets::{create_secret_handler, get_secret_handler};
