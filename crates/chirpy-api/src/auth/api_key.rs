//! Static API key check for service-to-service callers
//!
//! Used for the billing provider's webhook. The configured key is held only
//! as a SHA-256 digest; presented keys are digested and compared.

use super::error::AuthError;
use super::header::api_key;
use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

#[derive(Clone)]
pub struct ApiKeyGuard {
    /// `None` when no key is configured: every request is rejected
    expected: Option<[u8; 32]>,
}

impl ApiKeyGuard {
    pub fn new(key: Option<&str>) -> Self {
        let expected = key
            .filter(|k| !k.is_empty())
            .map(|k| Sha256::digest(k.as_bytes()).into());
        Self { expected }
    }

    pub fn is_configured(&self) -> bool {
        self.expected.is_some()
    }

    /// Accept the request only if its `Authorization: <scheme> <key>`
    /// header carries the configured key.
    pub fn check(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let presented = api_key(headers)?;

        let expected = self.expected.as_ref().ok_or(AuthError::InvalidApiKey)?;
        let digest: [u8; 32] = Sha256::digest(presented.as_bytes()).into();

        if constant_time_eq(&digest, expected) {
            Ok(())
        } else {
            Err(AuthError::InvalidApiKey)
        }
    }
}

/// Byte comparison whose running time does not depend on where the inputs
/// first differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

impl std::fmt::Debug for ApiKeyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyGuard")
            .field("configured", &self.is_configured())
            .finish()
    }
}
