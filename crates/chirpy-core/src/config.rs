//! Chirpy Configuration Management
//!
//! Handles configuration from environment variables and config files
//! with sensible defaults for development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Signing secret used when nothing is configured. Only accepted on the
/// `dev` platform, see [`AppConfig::validate`].
pub const DEVELOPMENT_JWT_SECRET: &str = "development-secret-key-change-in-production";

/// Longest accepted access token lifetime (one day)
pub const MAX_ACCESS_TOKEN_LIFETIME_SECS: i64 = 86_400;

/// Longest accepted refresh token lifetime (ten years)
pub const MAX_REFRESH_TOKEN_LIFETIME_DAYS: i64 = 3_650;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Deployment platform
    pub platform: Platform,

    /// Server configuration
    pub server: ServerConfig,

    /// Token and credential settings
    pub auth: AuthConfig,

    /// Database connection
    pub database: DatabaseConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(platform) = std::env::var("PLATFORM") {
            config.platform = platform.parse()?;
        }

        // Server
        if let Ok(host) = std::env::var("API_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("API_PORT") {
            config.server.port = parse_var("API_PORT", port)?;
        }

        // Auth
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            config.auth.jwt_secret = secret;
        }
        if let Ok(secs) = std::env::var("ACCESS_TOKEN_MAX_LIFETIME_SECS") {
            config.auth.access_token_max_lifetime_secs =
                parse_var("ACCESS_TOKEN_MAX_LIFETIME_SECS", secs)?;
        }
        if let Ok(days) = std::env::var("REFRESH_TOKEN_LIFETIME_DAYS") {
            config.auth.refresh_token_lifetime_days =
                parse_var("REFRESH_TOKEN_LIFETIME_DAYS", days)?;
        }
        if let Ok(key) = std::env::var("POLKA_KEY") {
            config.auth.polka_key = Some(key);
        }

        // PostgreSQL
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = Some(url);
        }
        if let Ok(size) = std::env::var("DATABASE_POOL_SIZE") {
            config.database.pool_size = parse_var("DATABASE_POOL_SIZE", size)?;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.logging.json_format = format.eq_ignore_ascii_case("json");
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;
        let defaults = Self::default();

        if env_config.platform != defaults.platform {
            self.platform = env_config.platform;
        }
        if env_config.server.host != defaults.server.host {
            self.server.host = env_config.server.host;
        }
        if env_config.server.port != defaults.server.port {
            self.server.port = env_config.server.port;
        }
        if env_config.auth.access_token_max_lifetime_secs
            != defaults.auth.access_token_max_lifetime_secs
        {
            self.auth.access_token_max_lifetime_secs = env_config.auth.access_token_max_lifetime_secs;
        }
        if env_config.auth.refresh_token_lifetime_days != defaults.auth.refresh_token_lifetime_days
        {
            self.auth.refresh_token_lifetime_days = env_config.auth.refresh_token_lifetime_days;
        }

        // Always use env for sensitive values
        if env_config.auth.jwt_secret != defaults.auth.jwt_secret {
            self.auth.jwt_secret = env_config.auth.jwt_secret;
        }
        if env_config.auth.polka_key.is_some() {
            self.auth.polka_key = env_config.auth.polka_key;
        }
        if env_config.database.url.is_some() {
            self.database.url = env_config.database.url;
        }

        Ok(self)
    }

    /// Reject configurations that are unsafe to serve with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let access_secs = self.auth.access_token_max_lifetime_secs;
        if !(1..=MAX_ACCESS_TOKEN_LIFETIME_SECS).contains(&access_secs) {
            return Err(ConfigError::InvalidValue {
                key: "ACCESS_TOKEN_MAX_LIFETIME_SECS".to_string(),
                value: access_secs.to_string(),
            });
        }
        let refresh_days = self.auth.refresh_token_lifetime_days;
        if !(1..=MAX_REFRESH_TOKEN_LIFETIME_DAYS).contains(&refresh_days) {
            return Err(ConfigError::InvalidValue {
                key: "REFRESH_TOKEN_LIFETIME_DAYS".to_string(),
                value: refresh_days.to_string(),
            });
        }
        if self.platform != Platform::Dev
            && (self.auth.jwt_secret.is_empty() || self.auth.jwt_secret == DEVELOPMENT_JWT_SECRET)
        {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Deployment platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Dev,
    Prod,
}

impl std::str::FromStr for Platform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Dev),
            "prod" | "production" => Ok(Self::Prod),
            _ => Err(ConfigError::InvalidValue {
                key: "PLATFORM".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Token and credential configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for access tokens
    pub jwt_secret: String,

    /// Ceiling for access token lifetimes, also the lifetime used when a
    /// caller asks for nothing or for something out of range (default: 1 hour)
    pub access_token_max_lifetime_secs: i64,

    /// Refresh token validity window (default: 60 days)
    pub refresh_token_lifetime_days: i64,

    /// Static key the billing provider presents on webhook calls
    pub polka_key: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
            access_token_max_lifetime_secs: 3600,
            refresh_token_lifetime_days: 60,
            polka_key: None,
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; in-memory stores are used when unset
    pub url: Option<String>,

    /// PostgreSQL connection pool size
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: 10,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
