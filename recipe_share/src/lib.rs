//! # Recipe Share
//!
//! Core library for the recipe sharing platform.
//!
//! This crate owns the authentication and session core: password hashing,
//! signed access tokens, server-side refresh tokens, and the session
//! lifecycle (register, login, refresh, logout, password change). The HTTP
//! surface lives in the `rs_server` binary crate; recipe storage and listing
//! are consumed by other services through the same database.
//!
//! ## Architecture
//!
//! A session moves through a small lifecycle:
//!
//! - **Anonymous**: no tokens held
//! - **Authenticated**: holds a short-lived signed access token plus a
//!   long-lived opaque refresh token
//! - **Rotated**: each refresh consumes the old refresh token and issues a
//!   fresh pair; a refresh token is never usable twice
//! - **Revoked**: logout (or a password change) deletes refresh tokens
//!   server-side
//!
//! Access tokens are verified by signature alone and never touch storage.
//! Refresh tokens are pure capability references backed by rows in
//! PostgreSQL, so revocation is immediate.
//!
//! ## Core Modules
//!
//! - [`auth`]: password hashing, token codec, request authentication, and
//!   the session manager
//! - [`db`]: connection pooling and the storage interface consumed by the
//!   auth core

/// Authentication and session management.
pub mod auth;
pub use auth::{
    AuthError, AuthManager, AuthResult, PasswordHasher, Principal, RequestAuthenticator,
    TokenCodec, TokenPair,
};

/// Database pooling and storage interface.
pub mod db;
pub use db::{Database, DatabaseConfig};
