//! Domain layer
//!
//! Secret records and the identifiers around them. No HTTP or database
//! types appear in here.
//!
//! ## Module Organization
//!
//! - `key`: access keys (generation and lookup parsing)
//! - `identity`: Telegram uploader/viewer identities
//! - `secret`: the record, its tagged payload and view log

pub mod identity;
pub mod key;
pub mod secret;

pub use identity::TelegramIdentity;
pub use key::SecretKey;
pub use secret::{SecretKind, SecretPayload, SecretRecord, SecretSummary, ViewEntry};
