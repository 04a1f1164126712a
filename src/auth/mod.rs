//! # Authorization
//!
//! Two guards protect the non-public routes:
//!
//! - admin routes compare the `x-telegram-user-id` header with the single
//!   configured admin id. The Mini App performs the same comparison for UI
//!   routing, but only this check decides access.
//! - the ingestion route requires a shared token in `x-ingest-token`.
//!
//! Every failure is a `401` so callers cannot tell a wrong id from a
//! disabled admin.

pub mod middleware;
pub mod policy;

pub use middleware::{require_admin, require_ingest_token, AdminContext};
pub use policy::{AdminPolicy, IngestToken};

/// Header carrying the caller's Telegram user id
pub const TELEGRAM_USER_ID_HEADER: &str = "x-telegram-user-id";

/// Header carrying the ingestion token
pub const INGEST_TOKEN_HEADER: &str = "x-ingest-token";
