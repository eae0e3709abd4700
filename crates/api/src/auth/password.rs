//! Credential checks for the user file.
//!
//! Users are stored with an Argon2id PHC string (`passwordHash`), which embeds
//! the parameters and salt. New hashes come from the `hash-password` binary.

use std::sync::LazyLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Stand-in credential checked when the username is unknown, so a failed
/// lookup costs the same as a wrong password.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("dummy-password-for-timing").unwrap_or_default());

/// Produce the PHC string stored in the user file for `password`.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|phc| phc.to_string())
}

/// Check a login password against a user's stored PHC string.
///
/// A mismatch is `Ok(false)`; only an unparseable stored hash is an error.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, password_hash::Error> {
    let stored = PasswordHash::new(stored)?;
    match Argon2::default().verify_password(password.as_bytes(), &stored) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Spend one full verification on a throwaway hash and discard the result.
pub fn burn_verification(password: &str) {
    let _ = verify_password(password, &DUMMY_HASH);
}
