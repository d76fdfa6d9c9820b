//! Chirpy API Server

use anyhow::Context;
use chirpy_api::{create_router, state::AppState};
use chirpy_core::{config::AppConfig, init_tracing};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config.logging);
    config.validate().context("invalid configuration")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = match config.database.url.clone() {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database.pool_size)
                .connect(&url)
                .await
                .context("PostgreSQL connection failed")?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("failed to run migrations")?;
            tracing::info!("Using PostgreSQL storage");
            AppState::with_postgres(config, pool)?
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage");
            AppState::in_memory(config)?
        }
    };

    if !state.api_key_guard.is_configured() {
        tracing::warn!("POLKA_KEY not set, webhook requests will be rejected");
    }

    let app = create_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Chirpy API Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
