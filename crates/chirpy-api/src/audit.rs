//! Security audit logging for authentication events
//!
//! Every event is logged at INFO level on the `audit` target so it can be
//! filtered and routed separately from application logs. The full event is
//! also attached as a JSON field for log aggregators.
//!
//! ```ignore
//! use chirpy_api::audit::{audit_log, AuditEvent};
//!
//! audit_log(&AuditEvent::LoginSuccess {
//!     user_id: user.id,
//!     email: user.email.clone(),
//!     ip_address: Some("192.168.1.1".to_string()),
//!     user_agent: None,
//! });
//! ```

use axum::http::{header, HeaderMap};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Security audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    LoginSuccess {
        user_id: Uuid,
        email: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    LoginFailure {
        email: String,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    RegistrationSuccess {
        user_id: Uuid,
        email: String,
        ip_address: Option<String>,
    },

    RegistrationFailure {
        email: String,
        reason: String,
        ip_address: Option<String>,
    },

    /// New access token minted from a refresh token
    TokenRefresh {
        user_id: Uuid,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Refresh token revoked (logout). `user_id` is absent when the token
    /// was unknown.
    SessionRevoked {
        user_id: Option<Uuid>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Missing, malformed, expired or otherwise rejected token
    InvalidToken {
        ip_address: Option<String>,
        user_agent: Option<String>,
        reason: String,
    },

    /// Service caller failed the static API key check
    ApiKeyRejected {
        ip_address: Option<String>,
        reason: String,
    },

    /// Premium membership granted by the billing webhook
    UserUpgraded { user_id: Uuid },
}

/// Log a security audit event with structured fields
pub fn audit_log(event: &AuditEvent) {
    let timestamp = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    match event {
        AuditEvent::LoginSuccess {
            user_id,
            email,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                email = %email,
                ip_address = ?ip_address,
                "Login successful"
            );
        }
        AuditEvent::LoginFailure {
            email,
            reason,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                email = %email,
                reason = %reason,
                ip_address = ?ip_address,
                "Login failed"
            );
        }
        AuditEvent::RegistrationSuccess {
            user_id,
            email,
            ip_address,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                email = %email,
                ip_address = ?ip_address,
                "Registration successful"
            );
        }
        AuditEvent::RegistrationFailure {
            email,
            reason,
            ip_address,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                email = %email,
                reason = %reason,
                ip_address = ?ip_address,
                "Registration failed"
            );
        }
        AuditEvent::TokenRefresh {
            user_id,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                ip_address = ?ip_address,
                "Token refresh"
            );
        }
        AuditEvent::SessionRevoked {
            user_id,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = ?user_id,
                ip_address = ?ip_address,
                "Session revoked"
            );
        }
        AuditEvent::InvalidToken {
            ip_address, reason, ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                ip_address = ?ip_address,
                reason = %reason,
                "Invalid token"
            );
        }
        AuditEvent::ApiKeyRejected { ip_address, reason } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                ip_address = ?ip_address,
                reason = %reason,
                "API key rejected"
            );
        }
        AuditEvent::UserUpgraded { user_id } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                "User upgraded to Chirpy Red"
            );
        }
    }
}

/// Client IP from `X-Forwarded-For` (first hop) or `X-Real-IP`
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(first_ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
    {
        return Some(first_ip.trim().to_string());
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_event_serialization() {
        let event = AuditEvent::LoginSuccess {
            user_id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            ip_address: Some("192.168.1.1".to_string()),
            user_agent: None,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event_type\":\"login_success\""));
        assert!(json.contains("test@example.com"));
    }

    #[test]
    fn test_session_events_name_the_subject() {
        let user_id = Uuid::new_v4();

        let refresh = serde_json::to_value(AuditEvent::TokenRefresh {
            user_id,
            ip_address: None,
            user_agent: None,
        })
        .unwrap();
        assert_eq!(refresh["event_type"], "token_refresh");
        assert_eq!(refresh["user_id"], user_id.to_string());

        let revoked = serde_json::to_value(AuditEvent::SessionRevoked {
            user_id: None,
            ip_address: None,
            user_agent: None,
        })
        .unwrap();
        assert_eq!(revoked["event_type"], "session_revoked");
        assert!(revoked["user_id"].is_null());
    }

    #[test]
    fn test_audit_log_all_events() {
        let events = [
            AuditEvent::LoginFailure {
                email: "test@example.com".to_string(),
                reason: "invalid_credentials".to_string(),
                ip_address: None,
                user_agent: None,
            },
            AuditEvent::InvalidToken {
                ip_address: Some("10.0.0.1".to_string()),
                user_agent: None,
                reason: "expired".to_string(),
            },
            AuditEvent::ApiKeyRejected {
                ip_address: None,
                reason: "invalid_api_key".to_string(),
            },
            AuditEvent::UserUpgraded {
                user_id: Uuid::new_v4(),
            },
        ];

        for event in &events {
            audit_log(event);
        }
    }

    #[test]
    fn test_extract_ip_from_x_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.1, 198.51.100.1".parse().unwrap(),
        );

        assert_eq!(extract_ip_address(&headers), Some("203.0.113.1".to_string()));
    }

    #[test]
    fn test_extract_ip_from_x_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "203.0.113.7".parse().unwrap());

        assert_eq!(extract_ip_address(&headers), Some("203.0.113.7".to_string()));
    }

    #[test]
    fn test_extract_missing_headers() {
        let headers = HeaderMap::new();

        assert_eq!(extract_ip_address(&headers), None);
        assert_eq!(extract_user_agent(&headers), None);
    }
}
