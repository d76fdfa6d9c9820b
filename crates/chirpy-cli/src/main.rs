//! Chirpy CLI - operator tools for credentials and access tokens
//!
//! Usage:
//!   chirpy hash-password <password>
//!   chirpy verify-password --hash <hash> <password>
//!   chirpy issue-token --user-id <uuid> [--lifetime-secs N]
//!   chirpy validate-token <token>

use anyhow::{bail, Context};
use chirpy_api::auth::{
    hash_password, issue_access_token, validate_access_token, verify_password, AccessTokenConfig,
};
use chirpy_core::{config::AppConfig, init_tracing};
use chrono::Duration;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "chirpy")]
#[command(about = "Chirpy authentication tools")]
#[command(version)]
struct Cli {
    /// TOML configuration file; environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash a password with Argon2id
    HashPassword { password: String },
    /// Check a password against a stored hash
    VerifyPassword {
        #[arg(long)]
        hash: String,
        password: String,
    },
    /// Issue an access token for a user
    IssueToken {
        #[arg(long)]
        user_id: Uuid,
        /// Requested lifetime; clamped to the configured maximum
        #[arg(long)]
        lifetime_secs: Option<i64>,
    },
    /// Validate an access token and print its user id
    ValidateToken { token: String },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

fn run(command: Commands, config: &AppConfig) -> anyhow::Result<String> {
    let access = AccessTokenConfig::from_auth_config(&config.auth);

    match command {
        Commands::HashPassword { password } => {
            if password.is_empty() {
                bail!("password must not be empty");
            }
            Ok(hash_password(&password)?)
        }
        Commands::VerifyPassword { hash, password } => {
            verify_password(&password, &hash)?;
            Ok("Password matches".to_string())
        }
        Commands::IssueToken {
            user_id,
            lifetime_secs,
        } => {
            let lifetime = lifetime_secs
                .and_then(Duration::try_seconds)
                .unwrap_or(access.max_lifetime);
            tracing::debug!(user_id = %user_id, "Issuing access token");
            Ok(issue_access_token(&access, user_id, lifetime)?)
        }
        Commands::ValidateToken { token } => {
            let user_id = validate_access_token(&access, &token)
                .context("access token rejected")?;
            Ok(user_id.to_string())
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_tracing(&config.logging);

    let output = run(cli.command, &config)?;
    println!("{output}");

    Ok(())
}
