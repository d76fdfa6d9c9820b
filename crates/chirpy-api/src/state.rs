//! Application state management

use crate::auth::{
    AccessTokenConfig, ApiKeyGuard, AuthSessionService, InMemoryRefreshTokenRepository,
    InMemoryUserDirectory, PgRefreshTokenRepository, PgUserDirectory, RefreshTokenRepository,
    RefreshTokenStore, UserDirectory,
};
use crate::auth::refresh::DEFAULT_REFRESH_TOKEN_LIFETIME_DAYS;
use crate::metrics::AuthMetrics;
use chirpy_core::config::AppConfig;
use chrono::Duration;
use sqlx::PgPool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Ready status
    pub is_ready: AtomicBool,
    /// Login / refresh / revoke orchestration
    pub sessions: AuthSessionService,
    /// User directory, shared with the session service
    pub users: Arc<dyn UserDirectory>,
    /// Billing webhook key check
    pub api_key_guard: ApiKeyGuard,
    pub metrics: AuthMetrics,
    /// Present when running against PostgreSQL
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// Build state over the given storage backends
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserDirectory>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
    ) -> Result<Self, prometheus::Error> {
        let store = RefreshTokenStore::with_lifetime(
            refresh_tokens,
            Duration::try_days(config.auth.refresh_token_lifetime_days)
                .unwrap_or_else(|| Duration::days(DEFAULT_REFRESH_TOKEN_LIFETIME_DAYS)),
        );
        let sessions = AuthSessionService::new(
            users.clone(),
            store,
            AccessTokenConfig::from_auth_config(&config.auth),
        );
        let api_key_guard = ApiKeyGuard::new(config.auth.polka_key.as_deref());

        Ok(Self {
            config,
            start_time: Instant::now(),
            is_ready: AtomicBool::new(true),
            sessions,
            users,
            api_key_guard,
            metrics: AuthMetrics::new()?,
            db_pool: None,
        })
    }

    /// State backed by in-memory repositories
    pub fn in_memory(config: AppConfig) -> Result<Self, prometheus::Error> {
        Self::new(
            config,
            Arc::new(InMemoryUserDirectory::new()),
            Arc::new(InMemoryRefreshTokenRepository::new()),
        )
    }

    /// State backed by PostgreSQL
    pub fn with_postgres(config: AppConfig, pool: PgPool) -> Result<Self, prometheus::Error> {
        let mut state = Self::new(
            config,
            Arc::new(PgUserDirectory::new(pool.clone())),
            Arc::new(PgRefreshTokenRepository::new(pool.clone())),
        )?;
        state.db_pool = Some(pool);
        Ok(state)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn is_ready(&self) -> bool {
        self.is_ready.load(Ordering::SeqCst)
    }

    pub fn set_ready(&self, ready: bool) {
        self.is_ready.store(ready, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_state_uses_configured_lifetimes() {
        let mut config = AppConfig::default();
        config.auth.access_token_max_lifetime_secs = 900;
        config.auth.polka_key = Some("key".to_string());

        let state = AppState::in_memory(config).unwrap();
        assert_eq!(
            state.sessions.access_config().max_lifetime,
            Duration::seconds(900)
        );
        assert!(state.api_key_guard.is_configured());
        assert!(state.db_pool.is_none());
    }

    #[test]
    fn test_ready_flag() {
        let state = AppState::in_memory(AppConfig::default()).unwrap();
        assert!(state.is_ready());
        state.set_ready(false);
        assert!(!state.is_ready());
    }
}
