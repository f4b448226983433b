//! OAuth handlers — authorization initiation, callback, disconnect, status.

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};

use skyvault_auth::oauth::ProviderStatus;
use skyvault_core::error::AppError;
use skyvault_entity::oauth::Provider;

use crate::dto::request::OAuthCallbackQuery;
use crate::dto::response::{AuthorizeResponse, MessageResponse, ProviderConnectedResponse};
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/auth/oauth/{provider}
///
/// Starts the authorization flow by handing the client the provider
/// consent URL.
pub async fn authorize(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Json<AuthorizeResponse>, AppError> {
    let provider: Provider = provider.parse()?;

    let request = state.oauth_manager.authorize_url(provider)?;

    Ok(Json(AuthorizeResponse {
        auth_url: request.auth_url,
        state: request.state,
    }))
}

/// GET /api/auth/callback/{provider}
///
/// Completes the authorization flow: exchanges the code for tokens and
/// stores them on the authenticated user.
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<OAuthCallbackQuery>,
    auth: AuthUser,
) -> Result<Json<ProviderConnectedResponse>, AppError> {
    let provider: Provider = provider.parse()?;

    let record = state
        .oauth_manager
        .complete_authorization(auth.id, provider, &query.code)
        .await?;

    Ok(Json(ProviderConnectedResponse {
        message: format!("{} connected", provider.display_name()),
        provider: provider.to_string(),
        expires_at: record.expires_at,
    }))
}

/// DELETE /api/auth/oauth/{provider}
pub async fn disconnect(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    let provider: Provider = provider.parse()?;

    state.oauth_manager.disconnect(auth.id, provider).await?;

    Ok(Json(MessageResponse {
        message: format!("{} disconnected", provider.display_name()),
    }))
}

/// GET /api/auth/oauth/status
pub async fn status(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Json<HashMap<String, ProviderStatus>> {
    Json(state.oauth_manager.connection_status(auth.user()))
}
