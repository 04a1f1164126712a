//! Admin and ingestion credential checks, independent of HTTP.

use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::errors::{AuthErrorType, Result, SecretDropError};

/// Who may use the admin endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdminPolicy {
    admin_id: Option<i64>,
}

impl AdminPolicy {
    /// `None` disables the admin endpoints entirely
    pub fn new(admin_id: Option<i64>) -> Self {
        Self { admin_id }
    }

    /// Check a raw identity header value, returning the verified admin id
    pub fn authorize(&self, header: Option<&str>) -> Result<i64> {
        let raw = header.map(str::trim).filter(|value| !value.is_empty()).ok_or_else(|| {
            SecretDropError::auth(
                "missing x-telegram-user-id header",
                AuthErrorType::MissingIdentity,
            )
        })?;

        let caller: i64 = raw.parse().map_err(|_| {
            SecretDropError::auth(
                "Unauthorized: x-telegram-user-id is not a Telegram user id",
                AuthErrorType::MalformedIdentity,
            )
        })?;

        match self.admin_id {
            None => Err(SecretDropError::auth("Unauthorized", AuthErrorType::AdminDisabled)),
            Some(admin_id) if admin_id != caller => {
                Err(SecretDropError::auth("Unauthorized", AuthErrorType::NotAdmin))
            }
            Some(admin_id) => Ok(admin_id),
        }
    }
}

/// Shared secret for the ingestion endpoint.
///
/// Only the SHA-256 digest is kept; comparisons run in constant time over
/// digests so neither content nor length leaks through timing.
#[derive(Clone)]
pub struct IngestToken {
    digest: Arc<[u8; 32]>,
}

impl IngestToken {
    pub fn new(token: &str) -> Self {
        Self { digest: Arc::new(digest(token)) }
    }

    pub fn verify(&self, presented: Option<&str>) -> Result<()> {
        let presented = presented.ok_or_else(|| {
            SecretDropError::auth("missing x-ingest-token header", AuthErrorType::InvalidIngestToken)
        })?;

        if bool::from(self.digest.as_slice().ct_eq(digest(presented).as_slice())) {
            Ok(())
        } else {
            Err(SecretDropError::auth(
                "Unauthorized: invalid ingest token",
                AuthErrorType::InvalidIngestToken,
            ))
        }
    }
}

impl fmt::Debug for IngestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestToken").field("digest", &"[REDACTED]").finish()
    }
}

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}
