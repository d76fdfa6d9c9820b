//! User registration and credential updates

use crate::audit::{audit_log, extract_ip_address, AuditEvent};
use crate::auth::{AuthenticatedUser, UserRecord};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
}

/// Credential update request; both fields are replaced
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
}

/// Public view of a user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_chirpy_red: bool,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
            is_chirpy_red: user.is_chirpy_red,
        }
    }
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 409, description = "Email already registered", body = crate::error::ApiError),
    )
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let user = match state.sessions.register(&request.email, &request.password).await {
        Ok(user) => user,
        Err(e) => {
            state.metrics.record("register", e.kind());
            audit_log(&AuditEvent::RegistrationFailure {
                email: request.email.clone(),
                reason: e.kind().to_string(),
                ip_address: extract_ip_address(&headers),
            });
            return Err(e.into());
        }
    };

    state.metrics.record("register", "success");
    audit_log(&AuditEvent::RegistrationSuccess {
        user_id: user.id,
        email: user.email.clone(),
        ip_address: extract_ip_address(&headers),
    });

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Change the authenticated user's email and password
#[utoipa::path(
    put,
    path = "/api/users",
    tag = "users",
    request_body = UpdateUserRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Credentials updated", body = UserResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "User no longer exists", body = crate::error::ApiError),
        (status = 409, description = "Email already registered", body = crate::error::ApiError),
    )
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    match state
        .sessions
        .update_credentials(caller.user_id, &request.email, &request.password)
        .await
    {
        Ok(user) => {
            state.metrics.record("update_credentials", "success");
            Ok(Json(UserResponse::from(user)))
        }
        Err(e) => {
            state.metrics.record("update_credentials", e.kind());
            Err(e.into())
        }
    }
}
