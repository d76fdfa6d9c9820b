//! Chirpy authentication API
//!
//! HTTP surface over the authentication and session-token subsystem in
//! [`auth`]: registration, login, refresh, revoke, an access-token guarded
//! whoami route, credential updates and the billing webhook guarded by a
//! static API key.

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use chirpy_core::config::AppConfig;
use state::AppState;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Chirpy Auth API",
        description = "Authentication and session tokens for Chirpy"
    ),
    paths(
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::health::prometheus_metrics,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::revoke,
        handlers::auth::me,
        handlers::webhooks::polka_webhook,
        handlers::admin::reset,
    ),
    components(schemas(
        error::ApiError,
        handlers::health::HealthResponse,
        handlers::health::ReadinessResponse,
        handlers::health::ReadinessChecks,
        handlers::users::CreateUserRequest,
        handlers::users::UpdateUserRequest,
        handlers::users::UserResponse,
        handlers::auth::LoginRequest,
        handlers::auth::LoginResponse,
        handlers::auth::RefreshResponse,
        handlers::auth::MeResponse,
        handlers::webhooks::PolkaWebhook,
        handlers::webhooks::PolkaWebhookData,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness, readiness and metrics"),
        (name = "users", description = "User registration"),
        (name = "auth", description = "Login and session tokens"),
        (name = "webhooks", description = "Billing provider callbacks"),
        (name = "admin", description = "Development-only administration"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("Authorization"))),
            );
        }
    }
}

/// Build the full application router over `state`
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::prometheus_metrics))
        .route("/admin/reset", post(handlers::admin::reset))
        .nest("/api", routes::api_routes(state.clone()))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Router over in-memory storage with a fixed webhook key (`test-polka-key`)
pub fn create_router_for_testing() -> Router {
    create_router(Arc::new(test_state()))
}

/// State used by [`create_router_for_testing`]
pub fn test_state() -> AppState {
    let mut config = AppConfig::default();
    config.auth.polka_key = Some("test-polka-key".to_string());

    match AppState::in_memory(config) {
        Ok(state) => state,
        Err(e) => panic!("failed to build test state: {e}"),
    }
}
