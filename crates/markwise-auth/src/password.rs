use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::error::AuthError;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Hash a password into PHC string format with a fresh salt.
///
/// Argon2 is deliberately slow, so this runs on the blocking pool.
pub async fn hash(argon2: &Argon2<'static>, password: &str) -> Result<String, AuthError> {
    let argon2 = argon2.clone();
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::PasswordHash(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::PasswordHash(e.to_string()))?
}

/// Check a password against a stored PHC hash. A malformed hash never verifies.
pub async fn verify(
    argon2: &Argon2<'static>,
    password: &str,
    phc: &str,
) -> Result<bool, AuthError> {
    let argon2 = argon2.clone();
    let password = password.to_string();
    let phc = phc.to_string();
    tokio::task::spawn_blocking(move || match PasswordHash::new(&phc) {
        Ok(parsed) => argon2.verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    })
    .await
    .map_err(|e| AuthError::PasswordHash(e.to_string()))
}
