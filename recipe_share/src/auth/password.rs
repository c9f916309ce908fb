//! Password hashing and verification.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use super::errors::{AuthError, AuthResult};

/// Salted one-way password hashing with a server-side pepper.
///
/// Uses Argon2id with default parameters, which keeps a single hash in the
/// tens-of-milliseconds range on current hardware. The pepper is appended to
/// the plaintext before hashing, so digests are only verifiable by a server
/// holding the same pepper.
#[derive(Clone)]
pub struct PasswordHasher {
    pepper: String,
}

impl PasswordHasher {
    pub fn new(pepper: impl Into<String>) -> Self {
        Self {
            pepper: pepper.into(),
        }
    }

    /// Hash a plaintext password.
    ///
    /// A fresh random salt is generated on every call, so hashing the same
    /// plaintext twice yields two different digests.
    pub fn hash(&self, plaintext: &str) -> AuthResult<String> {
        let peppered = format!("{}{}", plaintext, self.pepper);
        let salt = SaltString::generate(&mut OsRng);

        Ok(Argon2::default()
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    /// Verify a plaintext password against a stored digest.
    ///
    /// Returns `false` on mismatch and on digests that fail to parse; it
    /// never errors on untrusted input.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let peppered = format!("{}{}", plaintext, self.pepper);
        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };

        Argon2::default()
            .verify_password(peppered.as_bytes(), &parsed)
            .is_ok()
    }
}
