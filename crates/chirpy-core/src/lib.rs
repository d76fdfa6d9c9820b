//! Chirpy Core - configuration and telemetry shared by the Chirpy binaries
//!
//! - Application configuration (environment variables and TOML files)
//! - Tracing subscriber initialisation

pub mod config;
pub mod telemetry;

pub use config::{
    AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig, Platform, ServerConfig,
};
pub use telemetry::init_tracing;
