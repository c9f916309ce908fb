//! Authentication error types.

use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Database error; fatal for the current request, never retried here
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password hashing failed (configuration error, not user input)
    #[error("Password hashing failed")]
    HashingFailed,

    /// Token signing failed
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Unknown email or wrong password; deliberately indistinguishable
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Email already registered
    #[error("User with this email already exists")]
    UserAlreadyExists,

    /// Email address failed validation
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Display name failed validation
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Password failed validation
    #[error("Password too weak: {0}")]
    WeakPassword(String),

    /// No bearer token on the request
    #[error("No token provided")]
    TokenMissing,

    /// Token failed structural or signature checks
    #[error("Malformed token")]
    TokenMalformed,

    /// Token is past its expiry
    #[error("Token expired")]
    TokenExpired,

    /// Refresh token absent from storage (revoked, rotated, or never issued)
    #[error("Refresh token revoked or unknown")]
    TokenRevokedOrUnknown,

    /// User record not found (lookup by ID; never a login outcome)
    #[error("User not found")]
    UserNotFound,
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information.
    ///
    /// Database and signing errors are sanitized, and the expired/malformed
    /// distinction is collapsed so callers cannot probe which check failed.
    pub fn client_message(&self) -> String {
        match self {
            // Sanitize database errors - don't expose SQL details
            AuthError::Database(_) => "Internal server error".to_string(),
            // Sanitize signing errors - don't expose token structure
            AuthError::Jwt(_) => "Authentication failed".to_string(),
            // Expired and tampered tokens must present identically
            AuthError::TokenMalformed | AuthError::TokenExpired => {
                "Invalid or expired token".to_string()
            }
            AuthError::TokenRevokedOrUnknown => "Invalid or expired refresh token".to_string(),
            // All other errors are safe to expose
            _ => self.to_string(),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
