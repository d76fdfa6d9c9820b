//! Database models for authentication
//!
//! - UserRecord: a user's identity and password hash, owned by the user directory
//! - RefreshToken: long-lived opaque session tokens

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User account as held by the user directory
///
/// Maps to the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    /// Argon2id PHC string, never returned to clients
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub is_chirpy_red: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(email: impl Into<String>, hashed_password: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            hashed_password: hashed_password.into(),
            is_chirpy_red: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Refresh token row
///
/// Maps to the `refresh_tokens` table. `token` is the primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    /// 64 lowercase hex characters
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_password_hash_not_serialized() {
        let user = UserRecord::new("walt@breakingbad.com", "$argon2id$v=19$secret");
        let json = serde_json::to_string(&user).unwrap();

        assert!(json.contains("walt@breakingbad.com"));
        assert!(!json.contains("argon2id"));
        assert!(!user.is_chirpy_red);
    }

    #[test]
    fn test_refresh_token_expiry_boundary() {
        let now = Utc::now();
        let token = RefreshToken {
            token: "0".repeat(64),
            user_id: Uuid::new_v4(),
            created_at: now - Duration::days(60),
            expires_at: now,
            revoked_at: None,
        };

        assert!(token.is_expired_at(now));
        assert!(!token.is_expired_at(now - Duration::seconds(1)));
        assert!(!token.is_revoked());
    }
}
