//! Skyvault Server — authentication and OAuth token service
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use skyvault_auth::oauth::HttpTokenClient;
use skyvault_core::config::AppConfig;
use skyvault_core::error::AppError;
use skyvault_database::repositories::UserRepository;

#[tokio::main]
async fn main() {
    let env = std::env::var("SKYVAULT_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config, &env).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt().json().with_env_filter(filter).with_target(true).init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig, env: &str) -> Result<(), AppError> {
    tracing::info!("Starting Skyvault v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Refuse the placeholder secret outside development ─
    check_jwt_secret(&config, env)?;

    // ── Step 2: Database connection + migrations ─────────────────
    let db = skyvault_database::DatabasePool::connect(&config.database).await?;
    skyvault_database::migration::run_migrations(db.pool()).await?;

    // ── Step 3: Wire components ──────────────────────────────────
    let users = Arc::new(UserRepository::new(db.pool().clone()));
    let token_client = Arc::new(HttpTokenClient::new(Duration::from_secs(
        config.oauth.http_timeout_seconds,
    ))?);

    let server_config = config.server.clone();
    let state = skyvault_api::build_state(config, users, token_client)?;
    let app = skyvault_api::router::build_router(state);

    // ── Step 4: Serve ────────────────────────────────────────────
    let addr = format!("{}:{}", server_config.host, server_config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Skyvault server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    db.close().await;
    tracing::info!("Skyvault server shut down gracefully");
    Ok(())
}

/// The shipped JWT secret signs tokens anyone can forge. Warn loudly in
/// development; refuse to start in production.
fn check_jwt_secret(config: &AppConfig, env: &str) -> Result<(), AppError> {
    if !config.auth.uses_insecure_secret() {
        return Ok(());
    }

    if env == "production" {
        return Err(AppError::configuration(
            "auth.jwt_secret still has its default value; set a real secret before deploying",
        ));
    }

    tracing::warn!("auth.jwt_secret is the insecure default; do not deploy this configuration");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
