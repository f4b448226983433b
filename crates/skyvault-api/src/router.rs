//! Route definitions for the Skyvault HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via
//! Axum's `State` extractor.

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::cors::build_cors_layer;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(oauth_routes())
        .merge(user_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state.config.server.cors);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Auth endpoints: signup, login, refresh, me
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/me", get(handlers::auth::me))
}

/// OAuth endpoints: initiation, callback, disconnect, status
fn oauth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/oauth/status", get(handlers::oauth::status))
        .route("/auth/oauth/{provider}", get(handlers::oauth::authorize))
        .route("/auth/oauth/{provider}", delete(handlers::oauth::disconnect))
        .route("/auth/callback/{provider}", get(handlers::oauth::callback))
}

/// User self-service endpoints
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", put(handlers::user::update_profile))
        .route("/users/me/password", put(handlers::user::change_password))
}

/// Health endpoint
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
