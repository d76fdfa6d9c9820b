//! Authentication error taxonomy
//!
//! Every failure the auth subsystem can surface to a request handler is one
//! of these variants. Authentication failures render as `401` with a fixed
//! category message; `Hashing` and `Internal` render as `500` and never
//! include the underlying error text.

use super::jwt::TokenError;
use super::password::PasswordError;
use super::refresh::RefreshTokenError;
use super::repository::RepositoryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingAuth,

    #[error("Invalid Authorization header format")]
    MalformedAuth,

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Malformed token")]
    Malformed,

    #[error("Token was not issued as an access token")]
    WrongIssuer,

    #[error("Token has expired")]
    Expired,

    #[error("Token has been revoked")]
    Revoked,

    #[error("Token not found")]
    NotFound,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Internal authentication error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Hashing(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Short label used for metrics and audit records
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingAuth => "missing_auth",
            AuthError::MalformedAuth => "malformed_auth",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::BadSignature => "bad_signature",
            AuthError::Malformed => "malformed",
            AuthError::WrongIssuer => "wrong_issuer",
            AuthError::Expired => "expired",
            AuthError::Revoked => "revoked",
            AuthError::NotFound => "not_found",
            AuthError::InvalidApiKey => "invalid_api_key",
            AuthError::Hashing(_) => "hashing_error",
            AuthError::Internal(_) => "internal",
        }
    }

    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if self.is_internal() {
            tracing::error!(error = %self, "authentication subsystem failure");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::HashingFailed(msg) => AuthError::Hashing(msg),
            PasswordError::InvalidCredentials => AuthError::InvalidCredentials,
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::BadSignature => AuthError::BadSignature,
            TokenError::Expired => AuthError::Expired,
            TokenError::WrongIssuer => AuthError::WrongIssuer,
            TokenError::Malformed => AuthError::Malformed,
            TokenError::Encoding(e) => AuthError::Internal(format!("failed to sign token: {e}")),
            TokenError::LifetimeOutOfRange => {
                AuthError::Internal("access token lifetime out of range".to_string())
            }
        }
    }
}

impl From<RefreshTokenError> for AuthError {
    fn from(err: RefreshTokenError) -> Self {
        match err {
            RefreshTokenError::NotFound => AuthError::NotFound,
            RefreshTokenError::Expired => AuthError::Expired,
            RefreshTokenError::Revoked => AuthError::Revoked,
            other => AuthError::Internal(other.to_string()),
        }
    }
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_failures_are_unauthorized() {
        let errors = [
            AuthError::MissingAuth,
            AuthError::MalformedAuth,
            AuthError::InvalidCredentials,
            AuthError::BadSignature,
            AuthError::Malformed,
            AuthError::WrongIssuer,
            AuthError::Expired,
            AuthError::Revoked,
            AuthError::NotFound,
            AuthError::InvalidApiKey,
        ];

        for err in errors {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED, "{err:?}");
        }
    }

    #[test]
    fn test_infrastructure_failures_are_server_errors() {
        assert_eq!(
            AuthError::Hashing("rng".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AuthError::Internal("db down".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_error_body_hides_details() {
        let response = AuthError::Internal("connection refused at 10.0.0.3".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("10.0.0.3"));
        assert!(text.contains("Internal server error"));
    }

    #[test]
    fn test_refresh_errors_keep_their_category() {
        assert!(matches!(
            AuthError::from(RefreshTokenError::Revoked),
            AuthError::Revoked
        ));
        assert!(matches!(
            AuthError::from(RefreshTokenError::Expired),
            AuthError::Expired
        ));
        assert!(matches!(
            AuthError::from(RefreshTokenError::NotFound),
            AuthError::NotFound
        ));
        assert!(matches!(
            AuthError::from(RefreshTokenError::CollisionRetriesExhausted),
            AuthError::Internal(_)
        ));
    }
}
