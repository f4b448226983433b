//! User self-service handlers — profile update and password change.

use axum::Json;
use axum::extract::State;
use tracing::info;
use validator::Validate;

use skyvault_core::error::AppError;
use skyvault_entity::user::ProfileUpdate;

use crate::dto::request::{ChangePasswordRequest, UpdateProfileRequest};
use crate::dto::response::{MessageResponse, UserResponse};
use crate::extractors::AuthUser;
use crate::state::AppState;

/// PUT /api/users/me
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let updated = state
        .users
        .update_profile(
            auth.id,
            &ProfileUpdate {
                email: req.email,
                display_name: req.display_name,
            },
        )
        .await?;

    info!(user_id = %auth.id, "Profile updated");

    Ok(Json(updated.into()))
}

/// PUT /api/users/me/password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let valid = state
        .password_hasher
        .verify_password(&req.current_password, &auth.password_hash)?;
    if !valid {
        return Err(AppError::invalid_credentials(
            "Current password is incorrect",
        ));
    }

    let new_hash = state.password_hasher.hash_password(&req.new_password)?;
    state.users.update_password(auth.id, &new_hash).await?;

    info!(user_id = %auth.id, "Password changed");

    Ok(Json(MessageResponse {
        message: "Password updated".to_string(),
    }))
}
