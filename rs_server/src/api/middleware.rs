//! Authentication middleware for protected endpoints.
//!
//! Extracts the `Authorization: Bearer <token>` header, verifies it through
//! the library's [`RequestAuthenticator`], and injects the authenticated
//! [`Principal`](recipe_share::auth::Principal) into request extensions for
//! downstream handlers:
//!
//! ```rust,ignore
//! use axum::Extension;
//! use recipe_share::auth::Principal;
//!
//! async fn protected_handler(Extension(principal): Extension<Principal>) -> String {
//!     format!("Authenticated as user {}", principal.user_id)
//! }
//! ```

use axum::{
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{Json, Response},
};

use super::AppState;
use super::auth::ErrorResponse;

/// Verify the bearer token and inject the principal, or reject with 401.
///
/// A missing/malformed header and an invalid token both produce `401`, but
/// the body carries the distinct diagnostic ("No token provided" vs
/// "Invalid or expired token").
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match state.authenticator.authenticate(header) {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            Ok(next.run(request).await)
        }
        Err(err) => Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: err.client_message(),
            }),
        )),
    }
}
