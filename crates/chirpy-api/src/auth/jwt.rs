//! JWT access token generation and validation
//!
//! Implements stateless access tokens signed with HMAC-SHA256. Tokens carry
//! only the user id and standard timing claims; they cannot be revoked and
//! are kept short-lived instead.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Issuer stamped on every access token. Any other token class signed with
/// the same secret must use a different issuer.
pub const ACCESS_TOKEN_ISSUER: &str = "chirpy-access";

/// Lifetime used when nothing else is configured
pub const DEFAULT_ACCESS_TOKEN_LIFETIME_SECS: i64 = 3600;

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer (always [`ACCESS_TOKEN_ISSUER`])
    pub iss: String,
    /// Subject - user ID
    pub sub: String,
    /// Issued at timestamp (Unix epoch, UTC)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch, UTC)
    pub exp: i64,
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to encode JWT: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Token was not issued as an access token")]
    WrongIssuer,

    #[error("Invalid token format")]
    Malformed,

    #[error("Token lifetime out of range")]
    LifetimeOutOfRange,
}

/// Access token configuration
#[derive(Debug, Clone)]
pub struct AccessTokenConfig {
    /// Secret key for HMAC signing
    pub secret: String,
    /// Upper bound for requested lifetimes; also the fallback lifetime
    pub max_lifetime: Duration,
}

impl Default for AccessTokenConfig {
    fn default() -> Self {
        Self {
            secret: chirpy_core::config::DEVELOPMENT_JWT_SECRET.to_string(),
            max_lifetime: Duration::seconds(DEFAULT_ACCESS_TOKEN_LIFETIME_SECS),
        }
    }
}

impl AccessTokenConfig {
    pub fn new(secret: impl Into<String>, max_lifetime: Duration) -> Self {
        Self {
            secret: secret.into(),
            max_lifetime,
        }
    }

    /// Unrepresentable lifetimes fall back to
    /// [`DEFAULT_ACCESS_TOKEN_LIFETIME_SECS`].
    pub fn from_auth_config(config: &chirpy_core::AuthConfig) -> Self {
        let max_lifetime = Duration::try_seconds(config.access_token_max_lifetime_secs)
            .unwrap_or_else(|| Duration::seconds(DEFAULT_ACCESS_TOKEN_LIFETIME_SECS));
        Self::new(config.jwt_secret.clone(), max_lifetime)
    }

    /// Lifetime actually granted for a request: non-positive or oversized
    /// requests fall back to the configured maximum.
    pub fn effective_lifetime(&self, requested: Duration) -> Duration {
        if requested <= Duration::zero() || requested > self.max_lifetime {
            self.max_lifetime
        } else {
            requested
        }
    }
}

/// Generate a signed access token for `user_id`
///
/// # Example
///
/// ```no_run
/// use chirpy_api::auth::jwt::{issue_access_token, validate_access_token, AccessTokenConfig};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// let config = AccessTokenConfig::new("secret", Duration::hours(1));
/// let user_id = Uuid::new_v4();
/// let token = issue_access_token(&config, user_id, Duration::minutes(15)).unwrap();
/// assert_eq!(validate_access_token(&config, &token).unwrap(), user_id);
/// ```
pub fn issue_access_token(
    config: &AccessTokenConfig,
    user_id: Uuid,
    lifetime: Duration,
) -> Result<String, TokenError> {
    let now = Utc::now();
    let expires_at = now
        .checked_add_signed(config.effective_lifetime(lifetime))
        .ok_or(TokenError::LifetimeOutOfRange)?;

    let claims = Claims {
        iss: ACCESS_TOKEN_ISSUER.to_string(),
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(token)
}

/// Validate an access token and return the user id it was issued for
///
/// Checks, in order: structure and signature, expiry (no leeway), issuer,
/// and that the subject is a UUID.
pub fn validate_access_token(config: &AccessTokenConfig, token: &str) -> Result<Uuid, TokenError> {
    let claims = decode_claims(config, token)?;
    Uuid::parse_str(&claims.sub).map_err(|_| TokenError::Malformed)
}

pub(crate) fn decode_claims(config: &AccessTokenConfig, token: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_issuer(&[ACCESS_TOKEN_ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature => TokenError::BadSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidIssuer => TokenError::WrongIssuer,
        _ => TokenError::Malformed,
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sign(config: &AccessTokenConfig, claims: &Claims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_validate_token() {
        let config = AccessTokenConfig::default();
        let user_id = Uuid::parse_str("b8b69eb9-4fc8-4dcb-9d15-4978cbde44aa").unwrap();

        let token = issue_access_token(&config, user_id, Duration::hours(1))
            .expect("Failed to issue token");

        assert_eq!(token.split('.').count(), 3);
        let validated = validate_access_token(&config, &token).expect("Failed to validate token");
        assert_eq!(validated, user_id);
    }

    #[test]
    fn test_claims_carry_issuer_and_lifetime() {
        let config = AccessTokenConfig::default();
        let token = issue_access_token(&config, Uuid::new_v4(), Duration::minutes(10)).unwrap();

        let claims = decode_claims(&config, &token).unwrap();
        assert_eq!(claims.iss, ACCESS_TOKEN_ISSUER);
        assert_eq!(claims.exp - claims.iat, 600);
    }

    #[test]
    fn test_lifetime_clamping() {
        let config = AccessTokenConfig::new("secret", Duration::hours(1));

        assert_eq!(
            config.effective_lifetime(Duration::minutes(5)),
            Duration::minutes(5)
        );
        assert_eq!(config.effective_lifetime(Duration::zero()), Duration::hours(1));
        assert_eq!(
            config.effective_lifetime(Duration::seconds(-30)),
            Duration::hours(1)
        );
        assert_eq!(config.effective_lifetime(Duration::hours(24)), Duration::hours(1));
    }

    #[test]
    fn test_unrepresentable_lifetimes() {
        let auth = chirpy_core::AuthConfig {
            access_token_max_lifetime_secs: i64::MAX,
            ..Default::default()
        };
        let config = AccessTokenConfig::from_auth_config(&auth);
        assert_eq!(
            config.max_lifetime,
            Duration::seconds(DEFAULT_ACCESS_TOKEN_LIFETIME_SECS)
        );

        let unbounded = AccessTokenConfig::new("secret", Duration::days(1_000_000_000));
        assert!(matches!(
            issue_access_token(&unbounded, Uuid::new_v4(), Duration::days(1_000_000_000)),
            Err(TokenError::LifetimeOutOfRange)
        ));
    }

    #[test]
    fn test_invalid_token() {
        let config = AccessTokenConfig::default();
        let result = validate_access_token(&config, "invalid.token.here");
        assert!(matches!(result, Err(TokenError::Malformed)));
    }

    #[test]
    fn test_wrong_secret() {
        let config1 = AccessTokenConfig::new("secret1", Duration::hours(1));
        let config2 = AccessTokenConfig::new("secret2", Duration::hours(1));

        let token = issue_access_token(&config1, Uuid::new_v4(), Duration::hours(1)).unwrap();

        let result = validate_access_token(&config2, &token);
        assert!(matches!(result, Err(TokenError::BadSignature)));
    }

    #[test]
    fn test_expired_token() {
        let config = AccessTokenConfig::default();
        let now = Utc::now().timestamp();

        let token = sign(
            &config,
            &Claims {
                iss: ACCESS_TOKEN_ISSUER.to_string(),
                sub: Uuid::new_v4().to_string(),
                iat: now - 7200,
                exp: now - 3600,
            },
        );

        let result = validate_access_token(&config, &token);
        assert!(matches!(result, Err(TokenError::Expired)));
    }

    #[test]
    fn test_wrong_issuer() {
        let config = AccessTokenConfig::default();
        let now = Utc::now().timestamp();

        let token = sign(
            &config,
            &Claims {
                iss: "chirpy-refresh".to_string(),
                sub: Uuid::new_v4().to_string(),
                iat: now,
                exp: now + 3600,
            },
        );

        let result = validate_access_token(&config, &token);
        assert!(matches!(result, Err(TokenError::WrongIssuer)));
    }

    #[test]
    fn test_subject_must_be_uuid() {
        let config = AccessTokenConfig::default();
        let now = Utc::now().timestamp();

        let token = sign(
            &config,
            &Claims {
                iss: ACCESS_TOKEN_ISSUER.to_string(),
                sub: "not-a-user-id".to_string(),
                iat: now,
                exp: now + 3600,
            },
        );

        let result = validate_access_token(&config, &token);
        assert!(matches!(result, Err(TokenError::Malformed)));
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let config = AccessTokenConfig::default();
        let now = Utc::now().timestamp();

        let token = encode(
            &Header::new(Algorithm::HS512),
            &Claims {
                iss: ACCESS_TOKEN_ISSUER.to_string(),
                sub: Uuid::new_v4().to_string(),
                iat: now,
                exp: now + 3600,
            },
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            validate_access_token(&config, &token),
            Err(TokenError::Malformed)
        ));
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let config = AccessTokenConfig::default();
        let refresh = "a".repeat(64);
        assert!(matches!(
            validate_access_token(&config, &refresh),
            Err(TokenError::Malformed)
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_round_trip(bytes in any::<[u8; 16]>(), secret in "[ -~]{1,64}", secs in 1i64..=3600) {
            let config = AccessTokenConfig::new(secret, Duration::hours(1));
            let user_id = Uuid::from_bytes(bytes);
            let token = issue_access_token(&config, user_id, Duration::seconds(secs)).unwrap();
            prop_assert_eq!(validate_access_token(&config, &token).unwrap(), user_id);
        }
    }
}
