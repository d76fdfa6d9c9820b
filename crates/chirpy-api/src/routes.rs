//! API route definitions

use crate::auth::{require_access_token, require_api_key};
use crate::handlers::{auth, users, webhooks};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

/// Routes mounted under `/api`
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let access_guard = middleware::from_fn_with_state(state.clone(), require_access_token);

    // POST stays public, PUT needs an access token
    let users_route = post(users::create_user)
        .merge(put(users::update_user).route_layer(access_guard.clone()));

    // Refresh and revoke read the refresh token themselves
    let public_routes = Router::new()
        .route("/users", users_route)
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/revoke", post(auth::revoke));

    let protected_routes = Router::new()
        .route("/me", get(auth::me))
        .route_layer(access_guard);

    let webhook_routes = Router::new()
        .route("/polka/webhooks", post(webhooks::polka_webhook))
        .route_layer(middleware::from_fn_with_state(state, require_api_key));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(webhook_routes)
}
