//! Session handlers
//!
//! Login hands out an access token and a refresh token. Refresh and revoke
//! take the refresh token from the `Authorization: Bearer` header rather
//! than the body.

use super::users::UserResponse;
use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Login request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
}

/// Login response: the user plus both session tokens
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    /// Access token (JWT)
    pub token: String,
    /// Refresh token (64 hex characters)
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub user_id: Uuid,
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Incorrect email or password"),
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let session = match state.sessions.login(&request.email, &request.password).await {
        Ok(session) => session,
        Err(e) => {
            state.metrics.record("login", e.kind());
            audit_log(&AuditEvent::LoginFailure {
                email: request.email.clone(),
                reason: e.kind().to_string(),
                ip_address: extract_ip_address(&headers),
                user_agent: extract_user_agent(&headers),
            });
            return Err(e.into());
        }
    };

    state.metrics.record("login", "success");
    audit_log(&AuditEvent::LoginSuccess {
        user_id: session.user.id,
        email: session.user.email.clone(),
        ip_address: extract_ip_address(&headers),
        user_agent: extract_user_agent(&headers),
    });

    Ok(Json(LoginResponse {
        user: session.user.into(),
        token: session.access_token,
        refresh_token: session.refresh_token,
    }))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/refresh",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Missing, unknown, expired or revoked refresh token"),
    )
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let (user_id, token) = match state.sessions.refresh(&headers).await {
        Ok(refreshed) => refreshed,
        Err(e) => {
            state.metrics.record("refresh", e.kind());
            audit_log(&AuditEvent::InvalidToken {
                ip_address: extract_ip_address(&headers),
                user_agent: extract_user_agent(&headers),
                reason: e.kind().to_string(),
            });
            return Err(e.into());
        }
    };

    state.metrics.record("refresh", "success");
    audit_log(&AuditEvent::TokenRefresh {
        user_id,
        ip_address: extract_ip_address(&headers),
        user_agent: extract_user_agent(&headers),
    });

    Ok(Json(RefreshResponse { token }))
}

/// Revoke a refresh token (logout)
#[utoipa::path(
    post,
    path = "/api/revoke",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Refresh token revoked"),
        (status = 401, description = "Missing or malformed Authorization header"),
    )
)]
pub async fn revoke(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let user_id = match state.sessions.revoke_session(&headers).await {
        Ok(user_id) => user_id,
        Err(e) => {
            state.metrics.record("revoke", e.kind());
            return Err(e.into());
        }
    };

    state.metrics.record("revoke", "success");
    audit_log(&AuditEvent::SessionRevoked {
        user_id,
        ip_address: extract_ip_address(&headers),
        user_agent: extract_user_agent(&headers),
    });

    Ok(StatusCode::NO_CONTENT)
}

/// Identity of the access token's bearer
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Authenticated user", body = MeResponse),
        (status = 401, description = "Missing or invalid access token"),
    )
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> impl IntoResponse {
    state.metrics.record("authenticate", "success");
    Json(MeResponse {
        user_id: user.user_id,
    })
}
