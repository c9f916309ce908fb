//! Storage interface for credentials and refresh tokens.
//!
//! Trait-based abstractions over the relational store, enabling dependency
//! injection and mock-backed tests. The auth core only ever touches storage
//! through these traits; the PostgreSQL implementations below are wired in at
//! process startup.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::error::DatabaseError;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::auth::errors::{AuthError, AuthResult};
use crate::auth::models::{Credential, RefreshTokenRecord, UserId};

/// Server-side lifetime of a refresh token, in days.
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

/// Lookup and mutation of user identity records.
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Create a credential. A concurrent insert of the same email surfaces
    /// as [`AuthError::UserAlreadyExists`] via the unique constraint.
    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        display_name: &str,
    ) -> AuthResult<Credential>;

    /// Find a credential by email
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Credential>>;

    /// Find a credential by ID
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<Credential>>;

    /// Replace the stored password hash
    async fn update_password(&self, user_id: UserId, password_hash: &str) -> AuthResult<()>;
}

/// Persistence, validation, and revocation of opaque refresh tokens.
///
/// The `token` column is the primary key; delete-by-exact-value is therefore
/// the single-use arbiter under concurrent rotation, with no in-process
/// locking anywhere in this crate.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Persist a token for a user with expiry now + [`REFRESH_TOKEN_TTL_DAYS`].
    /// Users may hold any number of concurrent tokens (one per device).
    async fn store(&self, user_id: UserId, token: &str) -> AuthResult<()>;

    /// Look up a token by exact value.
    ///
    /// Unknown tokens reject as [`AuthError::TokenRevokedOrUnknown`]. A
    /// token past its expiry is deleted on the spot and rejects as
    /// [`AuthError::TokenExpired`].
    async fn validate(&self, token: &str) -> AuthResult<RefreshTokenRecord>;

    /// Delete the exact matching record. Idempotent; returns whether a row
    /// was actually removed, which callers use to detect a lost rotation
    /// race.
    async fn revoke(&self, token: &str) -> AuthResult<bool>;

    /// Delete every token belonging to the user
    async fn revoke_all(&self, user_id: UserId) -> AuthResult<()>;

    /// Delete all expired records; safe to run concurrently with any other
    /// operation. Returns the number of rows swept.
    async fn sweep_expired(&self) -> AuthResult<u64>;
}

/// PostgreSQL implementation of [`CredentialRepository`]
pub struct PgCredentialRepository {
    pool: PgPool,
}

impl PgCredentialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CREDENTIAL_COLUMNS: &str =
    "id, email, password_hash, display_name, created_at, updated_at";

fn credential_from_row(row: &PgRow) -> Credential {
    Credential {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        display_name: row.get("display_name"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
        updated_at: row.get::<chrono::NaiveDateTime, _>("updated_at").and_utc(),
    }
}

#[async_trait]
impl CredentialRepository for PgCredentialRepository {
    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        display_name: &str,
    ) -> AuthResult<Credential> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (email, password_hash, display_name)
             VALUES ($1, $2, $3)
             RETURNING {CREDENTIAL_COLUMNS}"
        ))
        .bind(email)
        .bind(password_hash)
        .bind(display_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation()) {
                AuthError::UserAlreadyExists
            } else {
                AuthError::Database(err)
            }
        })?;

        Ok(credential_from_row(&row))
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Credential>> {
        let row = sqlx::query(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(credential_from_row))
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<Credential>> {
        let row = sqlx::query(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(credential_from_row))
    }

    async fn update_password(&self, user_id: UserId, password_hash: &str) -> AuthResult<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// PostgreSQL implementation of [`RefreshTokenStore`]
pub struct PgRefreshTokenStore {
    pool: PgPool,
}

impl PgRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn store(&self, user_id: UserId, token: &str) -> AuthResult<()> {
        let expires_at = Utc::now() + Duration::days(REFRESH_TOKEN_TTL_DAYS);

        sqlx::query(
            "INSERT INTO refresh_tokens (token, user_id, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at.naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn validate(&self, token: &str) -> AuthResult<RefreshTokenRecord> {
        let row = sqlx::query(
            "SELECT rt.token, rt.user_id, rt.created_at, rt.expires_at, u.email
             FROM refresh_tokens rt
             JOIN users u ON u.id = rt.user_id
             WHERE rt.token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::TokenRevokedOrUnknown)?;

        let record = RefreshTokenRecord {
            token: row.get("token"),
            user_id: row.get("user_id"),
            email: row.get("email"),
            created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
            expires_at: row.get::<chrono::NaiveDateTime, _>("expires_at").and_utc(),
        };

        if record.expires_at < Utc::now() {
            // Lazy cleanup: first failed validation removes the row.
            sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
                .bind(token)
                .execute(&self.pool)
                .await?;
            return Err(AuthError::TokenExpired);
        }

        Ok(record)
    }

    async fn revoke(&self, token: &str) -> AuthResult<bool> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all(&self, user_id: UserId) -> AuthResult<()> {
        sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn sweep_expired(&self) -> AuthResult<u64> {
        // Expiries are stored as naive UTC, so compare against a bound UTC
        // timestamp rather than NOW() in session time.
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(Utc::now().naive_utc())
            .execute(&self.pool)
            .await?;

        let swept = result.rows_affected();
        if swept > 0 {
            log::debug!("swept {swept} expired refresh tokens");
        }
        Ok(swept)
    }
}
