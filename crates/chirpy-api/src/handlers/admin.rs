//! Development-only administration

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use chirpy_core::Platform;
use std::sync::Arc;

/// Delete every user and refresh token
///
/// Refused unless the server runs with `PLATFORM=dev`.
#[utoipa::path(
    post,
    path = "/admin/reset",
    tag = "admin",
    responses(
        (status = 200, description = "All users deleted", body = String),
        (status = 403, description = "Not running on the dev platform", body = crate::error::ApiError),
    )
)]
pub async fn reset(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    if state.config.platform != Platform::Dev {
        return Err(AppError::Forbidden(
            "Reset is only allowed on the dev platform".to_string(),
        ));
    }

    let removed = state.sessions.reset().await?;
    state.metrics.record("reset", "success");

    Ok((StatusCode::OK, format!("Deleted {removed} users")))
}
