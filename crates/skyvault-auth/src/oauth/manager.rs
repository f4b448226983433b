//! OAuth token lifecycle manager.
//!
//! Tracks one token record per (user, provider) pair and refreshes lazily:
//! a record is only refreshed when an operation asks for a token and the
//! stored one is inside the configured expiry lookahead. There is no
//! background scheduler.
//!
//! The read-check-refresh-write sequence is not mutually excluded per
//! (user, provider): two requests near the expiry boundary may both run
//! the exchange, and the last write wins on the stored record.

use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use skyvault_core::config::{OAuthConfig, ProviderSettings};
use skyvault_core::error::AppError;
use skyvault_database::UserStore;
use skyvault_entity::oauth::{Provider, ProviderTokenRecord};
use skyvault_entity::user::User;

use super::client::TokenEndpointClient;

/// A prepared authorization redirect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Provider consent URL the client should visit.
    pub auth_url: String,
    /// Anti-forgery state embedded in the URL.
    ///
    /// Returned to the caller but not persisted server-side, so it is not
    /// re-validated at callback time.
    pub state: String,
}

/// Connection summary for one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderStatus {
    /// Whether a token record is stored.
    pub connected: bool,
    /// Stored access token expiry, if any.
    pub expires_at: Option<DateTime<Utc>>,
    /// Granted scopes.
    pub scopes: Vec<String>,
}

/// Manages OAuth tokens for all providers on behalf of users.
#[derive(Clone)]
pub struct OAuthTokenManager {
    /// User persistence (token records live on the user row).
    users: Arc<dyn UserStore>,
    /// Provider token endpoint client.
    client: Arc<dyn TokenEndpointClient>,
    /// Provider endpoints, credentials, and refresh policy.
    config: OAuthConfig,
}

impl std::fmt::Debug for OAuthTokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthTokenManager")
            .field("providers", &self.config.providers.keys())
            .finish()
    }
}

impl OAuthTokenManager {
    /// Creates a manager over the given store, client, and configuration.
    pub fn new(
        users: Arc<dyn UserStore>,
        client: Arc<dyn TokenEndpointClient>,
        config: OAuthConfig,
    ) -> Self {
        Self {
            users,
            client,
            config,
        }
    }

    /// Builds the consent URL that starts the authorization flow.
    ///
    /// Fails with `UnsupportedProvider` for providers without an OAuth
    /// flow or without configured credentials.
    pub fn authorize_url(&self, provider: Provider) -> Result<AuthorizationRequest, AppError> {
        let settings = self.settings(provider)?;
        let state = generate_state();

        let url = reqwest::Url::parse_with_params(
            &settings.auth_url,
            &[
                ("client_id", settings.client_id.as_str()),
                ("redirect_uri", settings.redirect_uri.as_str()),
                ("scope", settings.scope.as_str()),
                ("response_type", "code"),
                ("state", state.as_str()),
                // Ask for a refresh token.
                ("access_type", "offline"),
            ],
        )
        .map_err(|e| {
            AppError::configuration(format!(
                "Invalid authorization URL for provider {provider}: {e}"
            ))
        })?;

        Ok(AuthorizationRequest {
            auth_url: url.to_string(),
            state,
        })
    }

    /// Completes an authorization flow by exchanging the code for tokens
    /// and storing the record, overwriting any prior record for the
    /// provider.
    ///
    /// Unlike the lazy refresh path this always performs the network
    /// exchange, and a failure surfaces as `ProviderExchangeFailed`.
    pub async fn complete_authorization(
        &self,
        user_id: Uuid,
        provider: Provider,
        code: &str,
    ) -> Result<ProviderTokenRecord, AppError> {
        let settings = self.settings(provider)?;

        let grant = self.client.exchange_code(settings, code).await?;

        let record = ProviderTokenRecord {
            expires_at: grant
                .expires_in
                .map(|seconds| Utc::now() + Duration::seconds(seconds)),
            scopes: grant.scopes(),
            refresh_token: grant.refresh_token,
            access_token: grant.access_token,
        };

        self.users
            .put_provider_tokens(user_id, provider.as_str(), &record)
            .await?;

        info!(%user_id, %provider, "Provider connected");

        Ok(record)
    }

    /// Returns a usable access token for the provider, refreshing it
    /// first when it is near expiry.
    ///
    /// `Ok(None)` means "no token available now": nothing stored, or the
    /// record is unrefreshable (no refresh token, provider without an
    /// OAuth flow), or the refresh exchange failed. In the failure cases
    /// the stale record is left in place so a later call can retry.
    pub async fn get_valid_access_token(
        &self,
        user_id: Uuid,
        provider: Provider,
    ) -> Result<Option<String>, AppError> {
        let Some(user) = self.users.find_by_id(user_id).await? else {
            return Ok(None);
        };
        let Some(record) = user.provider_tokens(provider.as_str()) else {
            return Ok(None);
        };

        // Fast path: token still comfortably valid (or never expires).
        if !record.is_expiring_within(self.config.refresh_lookahead_seconds) {
            return Ok(Some(record.access_token.clone()));
        }

        let settings = match self.settings(provider) {
            Ok(settings) => settings.clone(),
            Err(err) => {
                warn!(%user_id, %provider, error = %err, "Token expiring but provider cannot refresh");
                return Ok(None);
            }
        };

        let Some(refresh_token) = record.refresh_token.clone() else {
            warn!(%user_id, %provider, "Token expiring but no refresh token is stored");
            return Ok(None);
        };

        match self
            .run_refresh(user_id, provider, settings, refresh_token, record.scopes.clone())
            .await
        {
            Ok(record) => Ok(Some(record.access_token)),
            Err(err) => {
                warn!(
                    %user_id,
                    %provider,
                    error = %err,
                    "Provider token refresh failed, stale record left in place"
                );
                Ok(None)
            }
        }
    }

    /// Removes the stored token record for a provider. Returns whether a
    /// record existed.
    pub async fn disconnect(&self, user_id: Uuid, provider: Provider) -> Result<bool, AppError> {
        let removed = self
            .users
            .remove_provider_tokens(user_id, provider.as_str())
            .await?;

        if removed {
            info!(%user_id, %provider, "Provider disconnected");
        }

        Ok(removed)
    }

    /// Connection status for every OAuth-capable provider.
    pub fn connection_status(&self, user: &User) -> HashMap<String, ProviderStatus> {
        Provider::ALL
            .iter()
            .filter(|p| p.supports_oauth())
            .map(|p| {
                let status = match user.provider_tokens(p.as_str()) {
                    Some(record) => ProviderStatus {
                        connected: true,
                        expires_at: record.expires_at,
                        scopes: record.scopes.clone(),
                    },
                    None => ProviderStatus {
                        connected: false,
                        expires_at: None,
                        scopes: Vec::new(),
                    },
                };
                (p.as_str().to_string(), status)
            })
            .collect()
    }

    /// Runs the refresh exchange and persists the result.
    ///
    /// Spawned so the exchange-and-persist pair completes even if the
    /// inbound request that triggered it is aborted; a half-applied
    /// refresh could otherwise lose a provider-invalidated token.
    async fn run_refresh(
        &self,
        user_id: Uuid,
        provider: Provider,
        settings: ProviderSettings,
        refresh_token: String,
        prior_scopes: Vec<String>,
    ) -> Result<ProviderTokenRecord, AppError> {
        let users = Arc::clone(&self.users);
        let client = Arc::clone(&self.client);
        let default_ttl = self.config.default_token_ttl_seconds;

        let task = tokio::spawn(async move {
            let grant = client.refresh_token(&settings, &refresh_token).await?;

            let record = ProviderTokenRecord {
                expires_at: Some(
                    Utc::now() + Duration::seconds(grant.expires_in.unwrap_or(default_ttl)),
                ),
                scopes: if grant.scope.is_some() {
                    grant.scopes()
                } else {
                    prior_scopes
                },
                // Keep the original refresh token unless the provider
                // issued a replacement.
                refresh_token: grant.refresh_token.or(Some(refresh_token)),
                access_token: grant.access_token,
            };

            users
                .put_provider_tokens(user_id, provider.as_str(), &record)
                .await?;

            info!(%user_id, %provider, "Provider token refreshed");
            Ok(record)
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                error!(%user_id, %provider, error = %e, "Refresh task failed");
                Err(AppError::internal(format!("Refresh task failed: {e}")))
            }
        }
    }

    fn settings(&self, provider: Provider) -> Result<&ProviderSettings, AppError> {
        if !provider.supports_oauth() {
            return Err(AppError::unsupported_provider(format!(
                "Provider '{provider}' does not support OAuth"
            )));
        }

        self.config.provider(provider.as_str()).ok_or_else(|| {
            AppError::unsupported_provider(format!("Provider '{provider}' is not configured"))
        })
    }
}

/// Random URL-safe anti-forgery state.
fn generate_state() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}
