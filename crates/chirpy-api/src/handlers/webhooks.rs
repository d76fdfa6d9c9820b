//! Billing provider (Polka) webhook
//!
//! Only `user.upgraded` is acted on; every other event is acknowledged and
//! ignored. The route sits behind the API key guard.

use crate::audit::{audit_log, AuditEvent};
use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

pub const USER_UPGRADED_EVENT: &str = "user.upgraded";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PolkaWebhook {
    pub event: String,
    pub data: PolkaWebhookData,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PolkaWebhookData {
    pub user_id: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/polka/webhooks",
    tag = "webhooks",
    request_body = PolkaWebhook,
    security(("api_key" = [])),
    responses(
        (status = 204, description = "Event processed or ignored"),
        (status = 401, description = "Missing or invalid API key"),
        (status = 404, description = "Unknown user", body = crate::error::ApiError),
    )
)]
pub async fn polka_webhook(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PolkaWebhook>,
) -> Result<StatusCode, AppError> {
    if payload.event != USER_UPGRADED_EVENT {
        debug!(event = %payload.event, "Ignoring webhook event");
        return Ok(StatusCode::NO_CONTENT);
    }

    let user_id = payload.data.user_id;
    match state.users.upgrade_to_chirpy_red(user_id).await? {
        Some(_) => {
            state.metrics.record("upgrade", "success");
            audit_log(&AuditEvent::UserUpgraded { user_id });
            Ok(StatusCode::NO_CONTENT)
        }
        None => {
            state.metrics.record("upgrade", "not_found");
            Err(AppError::NotFound("User".to_string()))
        }
    }
}
