//! `Authorization` header parsing
//!
//! Two shapes are understood:
//! - `Authorization: Bearer <token>` for access and refresh tokens
//! - `Authorization: <scheme> <key>` for static service API keys
//!
//! Nothing here validates the extracted value; that is up to the caller.

use super::error::AuthError;
use axum::http::{header, HeaderMap};

const BEARER_PREFIX: &str = "Bearer ";

fn authorization(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?
        .to_str()
        .map_err(|_| AuthError::MalformedAuth)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// The prefix is case-sensitive and must be followed by a single space. The
/// remainder is returned verbatim and must not be empty.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = authorization(headers)?;

    match value.strip_prefix(BEARER_PREFIX) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedAuth),
    }
}

/// Extract the key from an `Authorization: <scheme> <key>` header.
///
/// The value must split on whitespace into exactly two parts.
pub fn api_key(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = authorization(headers)?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_scheme), Some(key), None) => Ok(key),
        _ => Err(AuthError::MalformedAuth),
    }
}
