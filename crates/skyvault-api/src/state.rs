//! Application state shared across all handlers.

use std::sync::Arc;

use skyvault_auth::gate::AuthGate;
use skyvault_auth::jwt::{JwtDecoder, JwtEncoder};
use skyvault_auth::oauth::{OAuthTokenManager, TokenEndpointClient};
use skyvault_auth::password::PasswordHasher;
use skyvault_auth::session::SessionManager;
use skyvault_core::config::AppConfig;
use skyvault_core::error::AppError;
use skyvault_database::UserStore;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// User persistence.
    pub users: Arc<dyn UserStore>,
    /// Password hasher (Argon2id).
    pub password_hasher: Arc<PasswordHasher>,
    /// Session token encoder.
    pub jwt_encoder: Arc<JwtEncoder>,
    /// Session token decoder.
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Token-to-identity resolution.
    pub auth_gate: Arc<AuthGate>,
    /// Signup/login/refresh flows.
    pub session_manager: Arc<SessionManager>,
    /// OAuth provider token lifecycle.
    pub oauth_manager: Arc<OAuthTokenManager>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish()
    }
}

/// Wires the auth components over the given store and token client.
///
/// Shared by the server binary and the integration tests so both run the
/// exact same construction path.
pub fn build_state(
    config: AppConfig,
    users: Arc<dyn UserStore>,
    token_client: Arc<dyn TokenEndpointClient>,
) -> Result<AppState, AppError> {
    let config = Arc::new(config);

    let password_hasher = Arc::new(PasswordHasher::new(&config.auth)?);
    let jwt_encoder = Arc::new(JwtEncoder::new(&config.auth));
    let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));

    let auth_gate = Arc::new(AuthGate::new(Arc::clone(&jwt_decoder), Arc::clone(&users)));

    let session_manager = Arc::new(SessionManager::new(
        Arc::clone(&users),
        Arc::clone(&password_hasher),
        Arc::clone(&jwt_encoder),
        Arc::clone(&jwt_decoder),
    ));

    let oauth_manager = Arc::new(OAuthTokenManager::new(
        Arc::clone(&users),
        token_client,
        config.oauth.clone(),
    ));

    Ok(AppState {
        config,
        users,
        password_hasher,
        jwt_encoder,
        jwt_decoder,
        auth_gate,
        session_manager,
        oauth_manager,
    })
}
