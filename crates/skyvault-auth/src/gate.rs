//! Identity resolution for protected operations.

use std::sync::Arc;

use tracing::debug;

use skyvault_core::error::AppError;
use skyvault_database::UserStore;
use skyvault_entity::user::User;

use crate::jwt::{JwtDecoder, TokenType};

/// Resolves a presented access token into an identity.
///
/// Three distinct failures are surfaced: `InvalidToken` (verification),
/// `NotFound` (identity vanished since issuance), and `Inactive`
/// (identity deactivated).
#[derive(Clone)]
pub struct AuthGate {
    /// Session token validator.
    decoder: Arc<JwtDecoder>,
    /// User lookup.
    users: Arc<dyn UserStore>,
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate").finish()
    }
}

impl AuthGate {
    /// Creates a gate over the given decoder and user store.
    pub fn new(decoder: Arc<JwtDecoder>, users: Arc<dyn UserStore>) -> Self {
        Self { decoder, users }
    }

    /// Verifies an access token and resolves the subject identity.
    pub async fn resolve_required(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decoder.verify(token, TokenType::Access)?;

        let user = self
            .users
            .find_by_username(&claims.sub)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if !user.is_active {
            return Err(AppError::inactive("Account is deactivated"));
        }

        Ok(user)
    }

    /// Resolves an identity when a credential is present and valid.
    ///
    /// Every failure — missing credential, invalid token, unknown or
    /// inactive user, store error — collapses to `None`. This is the one
    /// place that downgrade happens; endpoints that personalize behavior
    /// without requiring login opt into it.
    pub async fn resolve_optional(&self, token: Option<&str>) -> Option<User> {
        let token = token?;

        match self.resolve_required(token).await {
            Ok(user) => Some(user),
            Err(err) => {
                debug!(error = %err, "Optional authentication failed, continuing anonymously");
                None
            }
        }
    }
}
