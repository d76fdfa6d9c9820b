//! Authentication and session tokens
//!
//! - `password`: Argon2id credential hashing
//! - `header`: `Authorization` header parsing
//! - `jwt`: short-lived signed access tokens
//! - `refresh`: long-lived revocable refresh tokens
//! - `service`: login / refresh / revoke orchestration
//! - `api_key`: static key check for service callers
//! - `repository`: storage seams with in-memory and PostgreSQL backends
//! - `middleware`: axum route guards

pub mod api_key;
pub mod error;
pub mod header;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod refresh;
pub mod repository;
pub mod service;

pub use api_key::ApiKeyGuard;
pub use error::AuthError;
pub use jwt::{issue_access_token, validate_access_token, AccessTokenConfig, TokenError};
pub use middleware::{require_access_token, require_api_key, AuthenticatedUser};
pub use models::{RefreshToken, UserRecord};
pub use password::{hash_password, verify_password, PasswordError};
pub use refresh::{RefreshTokenError, RefreshTokenStore};
pub use repository::{
    InMemoryRefreshTokenRepository, InMemoryUserDirectory, PgRefreshTokenRepository,
    PgUserDirectory, RefreshTokenRepository, RepositoryError, UserDirectory,
};
pub use service::{AccountError, AuthSessionService, SessionTokens};
