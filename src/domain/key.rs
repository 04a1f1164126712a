//! Secret access keys
//!
//! A key is the only capability a non-admin caller needs to read a secret,
//! so generated keys carry ~142 bits of entropy from the thread-local CSPRNG.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of generated keys
pub const GENERATED_KEY_LEN: usize = 24;

/// Longest key accepted on lookup
pub const MAX_KEY_LEN: usize = 128;

/// Opaque, unique secret key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretKey(String);

impl SecretKey {
    /// Generate a fresh random key
    pub fn generate() -> Self {
        let key: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(GENERATED_KEY_LEN)
            .map(char::from)
            .collect();
        Self(key)
    }

    /// Parse a caller-supplied key.
    ///
    /// Returns `None` for strings that no stored key can ever equal
    /// (empty, too long, or outside `[A-Za-z0-9_-]`).
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || raw.len() > MAX_KEY_LEN {
            return None;
        }
        if !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    /// Create a key from a trusted source (database retrieval)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix safe to put in logs
    pub fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(8).collect();
        format!("{}...", prefix)
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SecretKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<SecretKey> for String {
    fn from(key: SecretKey) -> Self {
        key.0
    }
}
