//! Argon2id password hashing, the password policy, and verification codes.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::Rng;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Hash a plaintext password into a PHC string with a random salt
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check a plaintext password against a stored PHC hash.
///
/// A mismatch is `Ok(false)`; only malformed hashes are errors.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Enforce length, digit and uppercase requirements
pub fn validate_password_policy(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit".to_string());
    }
    if !password.chars().any(char::is_uppercase) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }
    Ok(())
}

/// Six random decimal digits for the double opt-in mail
pub fn generate_verification_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}
