//! Auth handlers — signup, login, refresh, me.

use axum::Json;
use axum::extract::State;
use validator::Validate;

use skyvault_auth::session::SignupData;
use skyvault_core::error::AppError;

use crate::dto::request::{LoginRequest, RefreshRequest, SignupRequest};
use crate::dto::response::{AuthResponse, RefreshResponse, UserResponse};
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let result = state
        .session_manager
        .signup(SignupData {
            username: req.username,
            email: req.email,
            password: req.password,
            display_name: req.display_name,
        })
        .await?;

    Ok(Json(AuthResponse {
        access_token: result.tokens.access_token,
        refresh_token: result.tokens.refresh_token,
        token_type: "bearer".to_string(),
        user: result.user.into(),
    }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let result = state
        .session_manager
        .login(&req.username, &req.password)
        .await?;

    Ok(Json(AuthResponse {
        access_token: result.tokens.access_token,
        refresh_token: result.tokens.refresh_token,
        token_type: "bearer".to_string(),
        user: result.user.into(),
    }))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AppError> {
    let minted = state.session_manager.refresh(&req.refresh_token).await?;

    Ok(Json(RefreshResponse {
        access_token: minted.token,
        token_type: "bearer".to_string(),
    }))
}

/// GET /api/auth/me
pub async fn me(auth: AuthUser) -> Json<UserResponse> {
    Json(auth.0.into())
}
