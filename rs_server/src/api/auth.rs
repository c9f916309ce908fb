//! Authentication API handlers.
//!
//! Thin wrappers over [`recipe_share::auth::AuthManager`]: each handler
//! deserializes a payload, delegates, and maps the rejection kind to an HTTP
//! status. The mapping is an exhaustive match, so adding a rejection kind
//! without a transport decision fails to compile instead of defaulting.
//!
//! # Examples
//!
//! Register a new user:
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/auth/register \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "cook@example.com", "name": "Early Riser", "password": "buttered6toast"}'
//! ```
//!
//! Login:
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/auth/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "cook@example.com", "password": "buttered6toast"}'
//! ```

use axum::{Extension, extract::State, http::StatusCode, response::Json};
use chrono::{DateTime, Utc};
use recipe_share::auth::{AuthError, Credential, Principal};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::request_id::RequestId;
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshPayload {
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogoutPayload {
    /// Revoke only this token; omit to log out everywhere.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordPayload {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<Credential> for UserResponse {
    fn from(credential: Credential) -> Self {
        Self {
            id: credential.id,
            email: credential.email,
            name: credential.display_name,
            created_at: credential.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map every rejection kind to a transport status.
///
/// Deliberately without a wildcard arm: a new `AuthError` variant must be
/// given a status here before the server compiles again.
fn status_for(err: &AuthError) -> StatusCode {
    match err {
        AuthError::Database(_) | AuthError::HashingFailed | AuthError::Jwt(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::UserAlreadyExists => StatusCode::CONFLICT,
        AuthError::InvalidEmail(_) | AuthError::InvalidName(_) | AuthError::WeakPassword(_) => {
            StatusCode::BAD_REQUEST
        }
        AuthError::TokenMissing
        | AuthError::TokenMalformed
        | AuthError::TokenExpired
        | AuthError::TokenRevokedOrUnknown => StatusCode::UNAUTHORIZED,
        AuthError::UserNotFound => StatusCode::NOT_FOUND,
    }
}

fn reject(err: AuthError) -> (StatusCode, Json<ErrorResponse>) {
    (
        status_for(&err),
        Json(ErrorResponse {
            error: err.client_message(),
        }),
    )
}

/// Register a new user account and log them in.
///
/// # Errors
///
/// - `400 Bad Request`: invalid email, name, or password
/// - `409 Conflict`: email already registered
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<Json<AuthResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state
        .auth_manager
        .register(&payload.email, &payload.name, &payload.password)
        .await
    {
        Ok((user, tokens)) => {
            metrics::registrations_total();
            Ok(Json(AuthResponse {
                user: user.into(),
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            }))
        }
        Err(err) => Err(reject(err)),
    }
}

/// Authenticate a user and issue a token pair.
///
/// # Errors
///
/// - `401 Unauthorized`: unknown email or wrong password (indistinguishable)
pub async fn login(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state
        .auth_manager
        .login(&payload.email, &payload.password)
        .await
    {
        Ok((user, tokens)) => {
            metrics::login_attempts_total(true);
            Ok(Json(AuthResponse {
                user: user.into(),
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            }))
        }
        Err(err) => {
            metrics::login_attempts_total(false);
            if matches!(err, AuthError::InvalidCredentials) {
                logging::log_security_event(
                    "failed_login",
                    None,
                    Some(request_id.as_str()),
                    "Invalid credentials on login",
                );
            }
            Err(reject(err))
        }
    }
}

/// Exchange a refresh token for a new token pair.
///
/// The old refresh token is consumed whether or not the caller sees the
/// response; clients must replace their stored pair. Any failure means the
/// session is over and the client should drop local state entirely.
///
/// # Errors
///
/// - `401 Unauthorized`: unknown, expired, or already-rotated token
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshPayload>,
) -> Result<Json<AuthResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.auth_manager.refresh(&payload.refresh_token).await {
        Ok((user, tokens)) => {
            metrics::token_refreshes_total(true);
            Ok(Json(AuthResponse {
                user: user.into(),
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            }))
        }
        Err(err) => {
            metrics::token_refreshes_total(false);
            Err(reject(err))
        }
    }
}

/// Revoke the given refresh token, or every token for the caller when none
/// is supplied (logout-everywhere).
///
/// Always succeeds for an authenticated caller, even if the tokens were
/// already gone.
pub async fn logout(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<LogoutPayload>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state
        .auth_manager
        .logout(principal.user_id, payload.refresh_token.as_deref())
        .await
    {
        Ok(()) => Ok(Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        })),
        Err(err) => Err(reject(err)),
    }
}

/// Change the caller's password.
///
/// On success every refresh token for the account is revoked; all devices
/// must log in again with the new password.
///
/// # Errors
///
/// - `400 Bad Request`: new password fails validation
/// - `401 Unauthorized`: current password is wrong
pub async fn change_password(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(request_id): Extension<RequestId>,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state
        .auth_manager
        .change_password(
            principal.user_id,
            &payload.current_password,
            &payload.new_password,
        )
        .await
    {
        Ok(()) => {
            logging::log_security_event(
                "password_changed",
                Some(principal.user_id),
                Some(request_id.as_str()),
                "Password changed; all sessions revoked",
            );
            Ok(Json(MessageResponse {
                message: "Password changed successfully. Please login again.".to_string(),
            }))
        }
        Err(err) => Err(reject(err)),
    }
}

/// Return the caller's user profile.
pub async fn me(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<UserResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.auth_manager.current_user(principal.user_id).await {
        Ok(user) => Ok(Json(user.into())),
        Err(err) => Err(reject(err)),
    }
}
