//! Refresh token issuance, validation and revocation
//!
//! Refresh tokens are opaque: 32 bytes from the OS CSPRNG, hex encoded.
//! Unlike access tokens they are stored server side, which is what makes
//! them revocable.

use super::models::RefreshToken;
use super::repository::{RefreshTokenRepository, RepositoryError};
use chrono::{Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Random bytes per refresh token (hex encoded to 64 characters)
pub const REFRESH_TOKEN_BYTES: usize = 32;

pub const DEFAULT_REFRESH_TOKEN_LIFETIME_DAYS: i64 = 60;

/// Generation attempts before giving up on uniqueness collisions
const MAX_GENERATION_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum RefreshTokenError {
    #[error("Refresh token not found")]
    NotFound,

    #[error("Refresh token has expired")]
    Expired,

    #[error("Refresh token has been revoked")]
    Revoked,

    #[error("Could not generate a unique refresh token")]
    CollisionRetriesExhausted,

    #[error("Refresh token lifetime out of range")]
    LifetimeOutOfRange,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn generate_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Refresh token lifecycle on top of a [`RefreshTokenRepository`]
#[derive(Clone)]
pub struct RefreshTokenStore {
    repo: Arc<dyn RefreshTokenRepository>,
    lifetime: Duration,
}

impl RefreshTokenStore {
    pub fn new(repo: Arc<dyn RefreshTokenRepository>) -> Self {
        Self::with_lifetime(repo, Duration::days(DEFAULT_REFRESH_TOKEN_LIFETIME_DAYS))
    }

    pub fn with_lifetime(repo: Arc<dyn RefreshTokenRepository>, lifetime: Duration) -> Self {
        Self { repo, lifetime }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issue and persist a new refresh token for `user_id`
    pub async fn issue(&self, user_id: Uuid) -> Result<RefreshToken, RefreshTokenError> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let now = Utc::now();
            let expires_at = now
                .checked_add_signed(self.lifetime)
                .ok_or(RefreshTokenError::LifetimeOutOfRange)?;
            let token = RefreshToken {
                token: generate_token(),
                user_id,
                created_at: now,
                expires_at,
                revoked_at: None,
            };

            match self.repo.insert(&token).await {
                Ok(()) => {
                    debug!(user_id = %user_id, "Issued refresh token");
                    return Ok(token);
                }
                Err(RepositoryError::Duplicate) => {
                    warn!(attempt, "Refresh token collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(RefreshTokenError::CollisionRetriesExhausted)
    }

    /// Look up the stored row for `token`
    pub async fn resolve(&self, token: &str) -> Result<RefreshToken, RefreshTokenError> {
        self.repo
            .find(token)
            .await?
            .ok_or(RefreshTokenError::NotFound)
    }

    /// Return the owning user id if `token` exists, is not revoked and has
    /// not expired. Checked in that order.
    pub async fn validate_usable(&self, token: &str) -> Result<Uuid, RefreshTokenError> {
        let row = self.resolve(token).await?;

        if row.is_revoked() {
            return Err(RefreshTokenError::Revoked);
        }
        if row.is_expired_at(Utc::now()) {
            return Err(RefreshTokenError::Expired);
        }

        Ok(row.user_id)
    }

    /// Revoke `token` and return the user it belonged to. Revoking an
    /// already revoked token succeeds and keeps the original revocation time.
    pub async fn revoke(&self, token: &str) -> Result<Uuid, RefreshTokenError> {
        self.repo
            .mark_revoked(token, Utc::now())
            .await?
            .map(|row| row.user_id)
            .ok_or(RefreshTokenError::NotFound)
    }

    /// Drop every stored refresh token
    pub async fn clear(&self) -> Result<u64, RefreshTokenError> {
        Ok(self.repo.delete_all().await?)
    }
}
