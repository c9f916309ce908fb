//! HTTP server for the recipe sharing platform.
//!
//! Wires the authentication core from `recipe_share` to an Axum router,
//! with database-backed refresh tokens and a periodic expiry sweep.

mod api;
mod config;
mod logging;
mod metrics;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Error;
use pico_args::Arguments;
use recipe_share::auth::{AuthManager, PasswordHasher, RequestAuthenticator, TokenCodec};
use recipe_share::db::{Database, PgCredentialRepository, PgRefreshTokenStore};

use config::ServerConfig;

const HELP: &str = "\
Run the recipe sharing auth server

USAGE:
  rs_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:3000]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or postgres://postgres@localhost/recipe_share_dev]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  METRICS_BIND             Optional Prometheus exporter address
  DATABASE_URL             PostgreSQL connection string
  JWT_SECRET               JWT signing secret (required)
  PASSWORD_PEPPER          Password hashing pepper (required)
  TOKEN_SWEEP_INTERVAL_SECS  Seconds between expired-token sweeps
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let database_url_override: Option<String> = pargs.opt_value_from_str("--db-url")?;

    logging::init();

    let config = ServerConfig::from_env(bind_override, database_url_override)?;

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(Error::msg)?;
        tracing::info!("Metrics exporter listening on {}", metrics_bind);
    }

    tracing::info!("Connecting to database");
    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
    tracing::info!("Database connected");

    let codec = TokenCodec::new(&config.security.jwt_secret);
    let auth_manager = Arc::new(AuthManager::new(
        Arc::new(PgCredentialRepository::new(db.pool().clone())),
        Arc::new(PgRefreshTokenStore::new(db.pool().clone())),
        PasswordHasher::new(config.security.password_pepper.clone()),
        codec.clone(),
    ));
    let authenticator = RequestAuthenticator::new(codec);

    spawn_token_sweeper(auth_manager.clone(), config.sweep_interval_secs);

    let state = api::AppState {
        auth_manager,
        authenticator,
        pool: Arc::new(db.pool().clone()),
    };
    let app = api::create_router(state);

    tracing::info!("Starting HTTP server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    tracing::info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    tracing::info!("Shutting down server");

    Ok(())
}

/// Periodically delete expired refresh tokens.
///
/// Login and refresh keep working while a sweep runs; the sweep only ever
/// removes rows that no longer validate anyway.
fn spawn_token_sweeper(auth_manager: Arc<AuthManager>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            match auth_manager.sweep_expired_tokens().await {
                Ok(0) => {}
                Ok(swept) => {
                    metrics::expired_tokens_swept(swept);
                    tracing::info!(swept, "Removed expired refresh tokens");
                }
                Err(err) => tracing::error!("Refresh-token sweep failed: {}", err),
            }
        }
    });
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}
