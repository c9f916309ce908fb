//! Authentication module providing registration, login, and session management.
//!
//! This module implements secure authentication with:
//! - Argon2id password hashing with a server-side pepper
//! - Signed JWT access tokens (15-minute expiry, verified without storage)
//! - Rotating opaque refresh tokens (7-day expiry, single-use, stored server-side)
//! - Bearer-header authentication for inbound requests
//!
//! All failures are returned as [`AuthError`] values; nothing in this module
//! panics on untrusted input. The error kinds that reach untrusted callers
//! are deliberately coarse: unknown email and wrong password are the same
//! rejection, and an expired token is indistinguishable from a tampered one.
//!
//! ## Example
//!
//! ```no_run
//! use recipe_share::auth::{AuthManager, PasswordHasher, TokenCodec};
//! use recipe_share::db::{Database, DatabaseConfig};
//! use recipe_share::db::repository::{PgCredentialRepository, PgRefreshTokenStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::default()).await?;
//!     let auth = AuthManager::new(
//!         Arc::new(PgCredentialRepository::new(db.pool().clone())),
//!         Arc::new(PgRefreshTokenStore::new(db.pool().clone())),
//!         PasswordHasher::new("secret_pepper"),
//!         TokenCodec::new("jwt_secret"),
//!     );
//!
//!     let (user, tokens) = auth
//!         .register("cook@example.com", "Early Riser", "buttered6toast")
//!         .await?;
//!     println!("Registered {} with access token {}", user.email, tokens.access_token);
//!     Ok(())
//! }
//! ```

pub mod authenticator;
pub mod errors;
pub mod manager;
pub mod models;
pub mod password;
pub mod tokens;

pub use authenticator::RequestAuthenticator;
pub use errors::{AuthError, AuthResult};
pub use manager::AuthManager;
pub use models::{AccessTokenClaims, Credential, Principal, RefreshTokenRecord, TokenPair, UserId};
pub use password::PasswordHasher;
pub use tokens::TokenCodec;
