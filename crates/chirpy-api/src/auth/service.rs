//! Authentication session service
//!
//! Orchestrates credential checks and token issuance for registration,
//! login, refresh and logout. Storage is reached only through the
//! [`UserDirectory`] and [`RefreshTokenStore`] seams.

use super::error::AuthError;
use super::header::bearer_token;
use super::jwt::{issue_access_token, validate_access_token, AccessTokenConfig};
use super::models::UserRecord;
use super::password::{hash_password, verify_password, PasswordError, UNKNOWN_USER_HASH};
use super::refresh::{RefreshTokenError, RefreshTokenStore};
use super::repository::{RepositoryError, UserDirectory};
use axum::http::HeaderMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Tokens handed out by a successful login
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub user: UserRecord,
    pub access_token: String,
    pub refresh_token: String,
}

/// Account management failures (registration and credential updates)
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Email already registered")]
    EmailTaken,

    #[error("User not found")]
    UserNotFound,

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl AccountError {
    pub fn kind(&self) -> &'static str {
        match self {
            AccountError::EmailTaken => "email_taken",
            AccountError::UserNotFound => "user_not_found",
            AccountError::Auth(e) => e.kind(),
        }
    }
}

async fn hash_off_reactor(password: &str) -> Result<String, AuthError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Internal(format!("hashing task failed: {e}")))?
        .map_err(AuthError::from)
}

type PasswordVerifier = fn(&str, &str) -> Result<(), PasswordError>;

/// Session service
pub struct AuthSessionService {
    users: Arc<dyn UserDirectory>,
    refresh_tokens: RefreshTokenStore,
    access: AccessTokenConfig,
    verify: PasswordVerifier,
}

impl AuthSessionService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        refresh_tokens: RefreshTokenStore,
        access: AccessTokenConfig,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            access,
            verify: verify_password,
        }
    }

    #[cfg(test)]
    fn with_verifier(mut self, verify: PasswordVerifier) -> Self {
        self.verify = verify;
        self
    }

    pub fn access_config(&self) -> &AccessTokenConfig {
        &self.access
    }

    /// Hash `password` and create a user for `email`
    pub async fn register(&self, email: &str, password: &str) -> Result<UserRecord, AccountError> {
        let hashed = hash_off_reactor(password).await?;

        match self.users.create_user(email, &hashed).await {
            Ok(user) => {
                info!(user_id = %user.id, "Registered user");
                Ok(user)
            }
            Err(RepositoryError::Duplicate) => Err(AccountError::EmailTaken),
            Err(e) => Err(AuthError::from(e).into()),
        }
    }

    /// Replace the email and password of an authenticated user
    ///
    /// Sessions already open for the user stay valid.
    pub async fn update_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        password: &str,
    ) -> Result<UserRecord, AccountError> {
        let hashed = hash_off_reactor(password).await?;

        match self.users.update_credentials(user_id, email, &hashed).await {
            Ok(Some(user)) => {
                info!(user_id = %user.id, "Updated user credentials");
                Ok(user)
            }
            Ok(None) => Err(AccountError::UserNotFound),
            Err(RepositoryError::Duplicate) => Err(AccountError::EmailTaken),
            Err(e) => Err(AuthError::from(e).into()),
        }
    }

    /// Delete every user and refresh token. Returns the number of users
    /// removed.
    pub async fn reset(&self) -> Result<u64, AuthError> {
        let tokens = self.refresh_tokens.clear().await?;
        let users = self.users.delete_all().await?;
        warn!(users, tokens, "Deleted all users and refresh tokens");
        Ok(users)
    }

    /// Verify credentials and open a new session
    ///
    /// Unknown email and wrong password are indistinguishable to the caller,
    /// in both response and timing: an unknown email is verified against
    /// [`UNKNOWN_USER_HASH`]. Existing sessions for the user are left alone.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionTokens, AuthError> {
        let user = self.users.find_by_email(email).await?;

        let password = password.to_owned();
        let hash = user
            .as_ref()
            .map_or(UNKNOWN_USER_HASH, |u| u.hashed_password.as_str())
            .to_owned();
        let verify = self.verify;
        let verified = tokio::task::spawn_blocking(move || verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("verification task failed: {e}")))?;

        let user = match (user, verified) {
            (Some(user), Ok(())) => user,
            (Some(user), Err(e)) => {
                warn!(user_id = %user.id, "Login rejected: wrong password");
                return Err(e.into());
            }
            (None, _) => {
                warn!("Login attempt for unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let access_token = issue_access_token(&self.access, user.id, self.access.max_lifetime)?;
        let refresh = self.refresh_tokens.issue(user.id).await?;

        info!(user_id = %user.id, "User logged in");

        Ok(SessionTokens {
            user,
            access_token,
            refresh_token: refresh.token,
        })
    }

    /// Exchange the bearer refresh token for a new access token, returned
    /// with the user it was issued for
    ///
    /// The refresh token itself is not rotated.
    pub async fn refresh(&self, headers: &HeaderMap) -> Result<(Uuid, String), AuthError> {
        let token = bearer_token(headers)?;
        let user_id = self.refresh_tokens.validate_usable(token).await?;

        let access_token = issue_access_token(&self.access, user_id, self.access.max_lifetime)?;
        debug!(user_id = %user_id, "Refreshed access token");

        Ok((user_id, access_token))
    }

    /// Revoke the bearer refresh token and return its owner
    ///
    /// An unknown token is logged and treated as already revoked; there is
    /// no owner to report then.
    pub async fn revoke_session(&self, headers: &HeaderMap) -> Result<Option<Uuid>, AuthError> {
        let token = bearer_token(headers)?;

        match self.refresh_tokens.revoke(token).await {
            Ok(user_id) => {
                info!(user_id = %user_id, "Refresh token revoked");
                Ok(Some(user_id))
            }
            Err(RefreshTokenError::NotFound) => {
                warn!("Revoke requested for unknown refresh token");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve the caller's user id from a bearer access token
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Uuid, AuthError> {
        let token = bearer_token(headers)?;
        Ok(validate_access_token(&self.access, token)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{decode_claims, ACCESS_TOKEN_ISSUER};
    use crate::auth::models::RefreshToken;
    use crate::auth::repository::{
        InMemoryRefreshTokenRepository, InMemoryUserDirectory, RefreshTokenRepository,
    };
    use axum::http::{header, HeaderValue};
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixture {
        service: AuthSessionService,
        tokens: Arc<InMemoryRefreshTokenRepository>,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserDirectory::new());
        let tokens = Arc::new(InMemoryRefreshTokenRepository::new());
        let service = AuthSessionService::new(
            users,
            RefreshTokenStore::new(tokens.clone()),
            AccessTokenConfig::from_auth_config(&chirpy_core::AuthConfig::default()),
        );
        Fixture { service, tokens }
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let f = fixture();
        let user = f.service.register("a@x.io", "04234").await.unwrap();

        let session = f.service.login("a@x.io", "04234").await.unwrap();
        assert_eq!(session.user.id, user.id);
        assert_eq!(session.refresh_token.len(), 64);
        assert_eq!(
            f.service.authenticate(&bearer(&session.access_token)).unwrap(),
            user.id
        );

        let (subject, refreshed) = f.service.refresh(&bearer(&session.refresh_token)).await.unwrap();
        assert_eq!(subject, user.id);
        assert_eq!(f.service.authenticate(&bearer(&refreshed)).unwrap(), user.id);

        assert_eq!(
            f.service
                .revoke_session(&bearer(&session.refresh_token))
                .await
                .unwrap(),
            Some(user.id)
        );

        assert!(matches!(
            f.service.refresh(&bearer(&session.refresh_token)).await,
            Err(AuthError::Revoked)
        ));

        // Access tokens are stateless and outlive the revoked session
        assert_eq!(
            f.service.authenticate(&bearer(&session.access_token)).unwrap(),
            user.id
        );
    }

    #[tokio::test]
    async fn test_login_token_lifetimes() {
        let f = fixture();
        f.service.register("a@x.io", "04234").await.unwrap();
        let session = f.service.login("a@x.io", "04234").await.unwrap();

        let claims = decode_claims(f.service.access_config(), &session.access_token).unwrap();
        assert_eq!(claims.iss, ACCESS_TOKEN_ISSUER);
        assert_eq!(claims.exp - claims.iat, 3600);

        let row = f.tokens.find(&session.refresh_token).await.unwrap().unwrap();
        assert_eq!(row.expires_at - row.created_at, Duration::days(60));
        assert!(row.revoked_at.is_none());
    }

    static VERIFY_CALLS: AtomicUsize = AtomicUsize::new(0);
    static PLACEHOLDER_VERIFIES: AtomicUsize = AtomicUsize::new(0);

    fn counting_verify(password: &str, hash: &str) -> Result<(), PasswordError> {
        VERIFY_CALLS.fetch_add(1, Ordering::SeqCst);
        if hash == UNKNOWN_USER_HASH {
            PLACEHOLDER_VERIFIES.fetch_add(1, Ordering::SeqCst);
        }
        verify_password(password, hash)
    }

    #[tokio::test]
    async fn test_unknown_email_still_verifies_a_hash() {
        let f = fixture();
        let service = f.service.with_verifier(counting_verify);
        service.register("a@x.io", "04234").await.unwrap();

        assert!(matches!(
            service.login("a@x.io", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert_eq!(VERIFY_CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(PLACEHOLDER_VERIFIES.load(Ordering::SeqCst), 0);

        assert!(matches!(
            service.login("nobody@x.io", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert_eq!(VERIFY_CALLS.load(Ordering::SeqCst), 2);
        assert_eq!(PLACEHOLDER_VERIFIES.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let f = fixture();
        f.service.register("a@x.io", "04234").await.unwrap();

        let wrong_password = f.service.login("a@x.io", "wrong").await.unwrap_err();
        let unknown_user = f.service.login("nobody@x.io", "04234").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let f = fixture();
        f.service.register("a@x.io", "04234").await.unwrap();

        assert!(matches!(
            f.service.register("a@x.io", "other").await,
            Err(AccountError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let f = fixture();
        f.service.register("a@x.io", "04234").await.unwrap();

        let first = f.service.login("a@x.io", "04234").await.unwrap();
        let second = f.service.login("a@x.io", "04234").await.unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);

        f.service
            .revoke_session(&bearer(&first.refresh_token))
            .await
            .unwrap();

        assert!(f.service.refresh(&bearer(&second.refresh_token)).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_errors() {
        let f = fixture();

        assert!(matches!(
            f.service.refresh(&HeaderMap::new()).await,
            Err(AuthError::MissingAuth)
        ));
        assert!(matches!(
            f.service.refresh(&bearer(&"0".repeat(64))).await,
            Err(AuthError::NotFound)
        ));

        let now = Utc::now();
        f.tokens
            .insert(&RefreshToken {
                token: "f".repeat(64),
                user_id: Uuid::new_v4(),
                created_at: now - Duration::days(60),
                expires_at: now - Duration::seconds(1),
                revoked_at: None,
            })
            .await
            .unwrap();

        assert!(matches!(
            f.service.refresh(&bearer(&"f".repeat(64))).await,
            Err(AuthError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_revoke_unknown_token_succeeds() {
        let f = fixture();
        assert_eq!(
            f.service
                .revoke_session(&bearer(&"0".repeat(64)))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_revoke_requires_header() {
        let f = fixture();
        assert!(matches!(
            f.service.revoke_session(&HeaderMap::new()).await,
            Err(AuthError::MissingAuth)
        ));
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let f = fixture();
        f.service.register("a@x.io", "04234").await.unwrap();
        let session = f.service.login("a@x.io", "04234").await.unwrap();

        assert!(matches!(
            f.service.authenticate(&bearer(&session.refresh_token)),
            Err(AuthError::Malformed)
        ));
        assert!(matches!(
            f.service.refresh(&bearer(&session.access_token)).await,
            Err(AuthError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_credentials() {
        let f = fixture();
        let user = f.service.register("a@x.io", "04234").await.unwrap();
        f.service.register("b@x.io", "pw").await.unwrap();

        let updated = f
            .service
            .update_credentials(user.id, "new@x.io", "newpass")
            .await
            .unwrap();
        assert_eq!(updated.email, "new@x.io");

        assert!(f.service.login("new@x.io", "newpass").await.is_ok());
        assert!(matches!(
            f.service.login("a@x.io", "04234").await,
            Err(AuthError::InvalidCredentials)
        ));

        assert!(matches!(
            f.service.update_credentials(user.id, "b@x.io", "x").await,
            Err(AccountError::EmailTaken)
        ));
        assert!(matches!(
            f.service.update_credentials(Uuid::new_v4(), "c@x.io", "x").await,
            Err(AccountError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_reset_removes_users_and_sessions() {
        let f = fixture();
        f.service.register("a@x.io", "04234").await.unwrap();
        let session = f.service.login("a@x.io", "04234").await.unwrap();

        assert_eq!(f.service.reset().await.unwrap(), 1);

        assert!(matches!(
            f.service.login("a@x.io", "04234").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            f.service.refresh(&bearer(&session.refresh_token)).await,
            Err(AuthError::NotFound)
        ));
    }
}
