/// Route guards
///
/// - `require_access_token`: bearer access token; adds [`AuthenticatedUser`]
///   to the request extensions
/// - `require_api_key`: static service API key
///
/// Rejections are audited and counted before the error response is returned.
use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::error::AuthError;

/// Caller identity established by [`require_access_token`]
///
/// ```ignore
/// async fn handler(Extension(user): Extension<AuthenticatedUser>) -> String {
///     user.user_id.to_string()
/// }
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

pub async fn require_access_token(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user_id = match state.sessions.authenticate(request.headers()) {
        Ok(id) => id,
        Err(e) => {
            audit_log(&AuditEvent::InvalidToken {
                ip_address: extract_ip_address(request.headers()),
                user_agent: extract_user_agent(request.headers()),
                reason: e.kind().to_string(),
            });
            state.metrics.record("authenticate", e.kind());
            return Err(e);
        }
    };

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user_id });

    Ok(next.run(request).await)
}

pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if let Err(e) = state.api_key_guard.check(request.headers()) {
        audit_log(&AuditEvent::ApiKeyRejected {
            ip_address: extract_ip_address(request.headers()),
            reason: e.kind().to_string(),
        });
        state.metrics.record("api_key", e.kind());
        return Err(e);
    }

    Ok(next.run(request).await)
}
