/// Password hashing and verification using Argon2id
///
/// - Algorithm: Argon2id (memory-hard, resistant to GPU attacks)
/// - Cost: the argon2 crate's recommended defaults (19 MiB, 2 passes, 1 lane)
/// - Salt: 16 bytes random per call, embedded in the PHC output
///
/// Both operations are CPU-bound and deliberately slow. Async code should call
/// them through `tokio::task::spawn_blocking`.
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

/// Password hashing and verification errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    /// Mismatch, malformed stored hash or empty password. Deliberately
    /// undifferentiated.
    #[error("Invalid credentials")]
    InvalidCredentials,
}

/// Well-formed Argon2id hash that matches no password. Verified against when
/// a login names an unknown email so both failure paths pay the same cost.
/// Parameters must stay in step with [`hasher`].
pub const UNKNOWN_USER_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$HY21LfyF/bMpkMidWC3RaA$j8txR12dRf2mVqQvlWTrC3kce+6qgOwleWoLRBnEwRw";

fn hasher() -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default())
}

/// Hash a plaintext password using Argon2id
///
/// # Returns
///
/// * `Ok(String)` - PHC string format hash (includes algorithm, parameters, salt, and hash)
/// * `Err(PasswordError)` - If hashing fails
///
/// # Example
///
/// ```no_run
/// use chirpy_api::auth::password::hash_password;
///
/// let hash = hash_password("04234").expect("Failed to hash password");
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = hasher()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a plaintext password against a stored hash
///
/// Parameters and salt are read from the stored PHC string, so hashes
/// produced under older cost settings still verify.
///
/// # Returns
///
/// * `Ok(())` - Password matches
/// * `Err(PasswordError::InvalidCredentials)` - Anything else
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::InvalidCredentials);
    }

    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidCredentials)?;

    hasher()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| PasswordError::InvalidCredentials)
}
