//! HTTP API for the recipe sharing platform's authentication core.
//!
//! # Architecture
//!
//! The API is built with:
//! - **Axum**: async web framework
//! - **Tower-http**: CORS middleware
//! - **JWT access tokens + rotating refresh tokens** from the
//!   `recipe_share` library
//!
//! # Modules
//!
//! - [`auth`]: authentication endpoints (register, login, refresh, logout,
//!   change-password, me)
//! - [`middleware`]: bearer-token authentication for protected endpoints
//! - [`request_id`]: request ID generation and propagation
//!
//! # Endpoints Overview
//!
//! ## Public
//! - `POST /api/v1/auth/register` - Register new user
//! - `POST /api/v1/auth/login` - Login with credentials
//! - `POST /api/v1/auth/refresh` - Rotate a refresh token
//! - `GET  /health` - Server health status
//!
//! ## Protected (Authorization: Bearer <access token>)
//! - `POST /api/v1/auth/logout` - Revoke one or all refresh tokens
//! - `POST /api/v1/auth/change-password` - Change password, revoke all sessions
//! - `GET  /api/v1/auth/me` - Current user profile

pub mod auth;
pub mod middleware;
pub mod request_id;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use recipe_share::auth::{AuthManager, RequestAuthenticator};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request (cheap due to Arc wrappers).
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
    pub authenticator: RequestAuthenticator,
    pub pool: Arc<PgPool>,
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    let root_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(root_routes)
        .nest("/api/v1", v1_routes)
        // Legacy unversioned routes kept for existing clients
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create the API v1 router with all versioned endpoints.
fn create_v1_router(state: AppState) -> Router<AppState> {
    // Refresh is public: the refresh token itself is the credential.
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh_token));

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/change-password", post(auth::change_password))
        .route("/auth/me", get(auth::me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the database answers a trivial query, otherwise
/// `503 Service Unavailable`.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = sqlx::query("SELECT 1")
        .fetch_one(&*state.pool)
        .await
        .is_ok();

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
