//! Argon2 password hashing for stored credentials.
//!
//! Hashes are stored as PHC strings so the algorithm and its parameters
//! travel with each hash.

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::rngs::OsRng;
use tracing::warn;

use crate::domain::Password;
use crate::domain::ports::AccountPersistenceError;

/// Hash `password` with a fresh random salt.
pub(crate) fn hash_password(password: &Password) -> Result<String, AccountPersistenceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.expose().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AccountPersistenceError::query(format!("password hashing failed: {err}")))
}

/// Check `password` against a stored PHC string.
///
/// A hash that cannot be parsed never verifies.
pub(crate) fn verify_password(stored: &str, password: &Password) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.expose().as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            warn!(error = %err, "stored password hash is malformed");
            false
        }
    }
}
