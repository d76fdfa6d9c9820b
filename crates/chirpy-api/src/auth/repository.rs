//! Storage access for authentication entities
//!
//! This module provides the persistence seams the auth core depends on:
//! - `RefreshTokenRepository`: refresh token rows
//! - `UserDirectory`: credential lookup and user creation
//!
//! Each has an in-memory implementation (development and tests) and a
//! PostgreSQL implementation backed by `sqlx`.

use super::models::{RefreshToken, UserRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Repository errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Uniqueness violation on insert
    #[error("Record already exists")]
    Duplicate,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::Duplicate
            }
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

/// Row store for refresh tokens
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Persist a new row. Fails with `Duplicate` if the token already exists.
    async fn insert(&self, token: &RefreshToken) -> Result<(), RepositoryError>;

    async fn find(&self, token: &str) -> Result<Option<RefreshToken>, RepositoryError>;

    /// Set `revoked_at` to `at` unless it is already set. Returns the
    /// resulting row, or `None` for an unknown token.
    async fn mark_revoked(
        &self,
        token: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, RepositoryError>;

    /// Remove every row. Returns the number removed.
    async fn delete_all(&self) -> Result<u64, RepositoryError>;
}

/// User directory consulted by login and registration
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError>;

    /// Create a user. Fails with `Duplicate` if the email is taken.
    async fn create_user(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, RepositoryError>;

    /// Replace a user's email and password hash. Returns `None` for an
    /// unknown user and `Duplicate` if the email belongs to someone else.
    async fn update_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<UserRecord>, RepositoryError>;

    /// Flag a user as premium. Returns `None` for an unknown user.
    async fn upgrade_to_chirpy_red(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserRecord>, RepositoryError>;

    /// Remove every user. Returns the number removed.
    async fn delete_all(&self) -> Result<u64, RepositoryError>;
}

// ============================================================================
// In-memory implementations
// ============================================================================

#[derive(Default)]
pub struct InMemoryRefreshTokenRepository {
    tokens: RwLock<HashMap<String, RefreshToken>>,
}

impl InMemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn insert(&self, token: &RefreshToken) -> Result<(), RepositoryError> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&token.token) {
            return Err(RepositoryError::Duplicate);
        }
        tokens.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<RefreshToken>, RepositoryError> {
        Ok(self.tokens.read().await.get(token).cloned())
    }

    async fn mark_revoked(
        &self,
        token: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, RepositoryError> {
        let mut tokens = self.tokens.write().await;
        Ok(tokens.get_mut(token).map(|row| {
            row.revoked_at.get_or_insert(at);
            row.clone()
        }))
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let mut tokens = self.tokens.write().await;
        let removed = tokens.len() as u64;
        tokens.clear();
        Ok(removed)
    }
}

#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, RepositoryError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email) {
            return Err(RepositoryError::Duplicate);
        }

        let user = UserRecord::new(email, hashed_password);
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email && u.id != user_id) {
            return Err(RepositoryError::Duplicate);
        }

        Ok(users.get_mut(&user_id).map(|user| {
            user.email = email.to_string();
            user.hashed_password = hashed_password.to_string();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn upgrade_to_chirpy_red(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&user_id).map(|user| {
            user.is_chirpy_red = true;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let mut users = self.users.write().await;
        let removed = users.len() as u64;
        users.clear();
        Ok(removed)
    }
}

// ============================================================================
// PostgreSQL implementations
// ============================================================================

pub struct PgRefreshTokenRepository {
    pool: PgPool,
}

impl PgRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for PgRefreshTokenRepository {
    async fn insert(&self, token: &RefreshToken) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token, user_id, created_at, expires_at, revoked_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&token.token)
        .bind(token.user_id)
        .bind(token.created_at)
        .bind(token.expires_at)
        .bind(token.revoked_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<RefreshToken>, RepositoryError> {
        let row = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT token, user_id, created_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn mark_revoked(
        &self,
        token: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, RepositoryError> {
        let row = sqlx::query_as::<_, RefreshToken>(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = COALESCE(revoked_at, $2)
            WHERE token = $1
            RETURNING token, user_id, created_at, expires_at, revoked_at
            "#,
        )
        .bind(token)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM refresh_tokens")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, hashed_password, is_chirpy_red, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_user(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, RepositoryError> {
        let user = UserRecord::new(email, hashed_password);

        let created = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, email, hashed_password, is_chirpy_red, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, hashed_password, is_chirpy_red, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(user.is_chirpy_red)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users
            SET email = $2, hashed_password = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, hashed_password, is_chirpy_red, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(hashed_password)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn upgrade_to_chirpy_red(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users
            SET is_chirpy_red = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, hashed_password, is_chirpy_red, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
