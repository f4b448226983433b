//! Provider token endpoint client.
//!
//! Providers speak the standard OAuth 2.0 token grant protocol: a
//! form-encoded POST carrying either an `authorization_code` or a
//! `refresh_token` grant, answered with a JSON token payload.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use skyvault_core::config::ProviderSettings;
use skyvault_core::error::AppError;

/// Token payload returned by a provider token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    /// The issued access token.
    pub access_token: String,
    /// A replacement refresh token, when the provider issues one.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Space-delimited granted scope string.
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenGrant {
    /// The granted scopes as a list (empty when the provider omitted
    /// the `scope` field).
    pub fn scopes(&self) -> Vec<String> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// Outbound calls to provider token endpoints.
#[async_trait]
pub trait TokenEndpointClient: Send + Sync {
    /// Exchange an authorization code for the initial token set.
    async fn exchange_code(
        &self,
        settings: &ProviderSettings,
        code: &str,
    ) -> Result<TokenGrant, AppError>;

    /// Exchange a refresh token for a fresh access token.
    async fn refresh_token(
        &self,
        settings: &ProviderSettings,
        refresh_token: &str,
    ) -> Result<TokenGrant, AppError>;
}

/// reqwest-backed token endpoint client with a bounded timeout.
#[derive(Debug, Clone)]
pub struct HttpTokenClient {
    http: reqwest::Client,
}

impl HttpTokenClient {
    /// Creates a client whose requests time out after `timeout` so a slow
    /// provider cannot stall the calling request indefinitely.
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http })
    }

    async fn post_grant(
        &self,
        token_url: &str,
        params: &[(&str, &str)],
    ) -> Result<TokenGrant, AppError> {
        let response = self
            .http
            .post(token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    skyvault_core::error::ErrorKind::ProviderExchangeFailed,
                    format!("Token endpoint request failed: {e}"),
                    e,
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable>".to_string());
            warn!(%status, error = %body, "Token endpoint returned non-success");
            return Err(AppError::provider_exchange(format!(
                "Token endpoint returned {status}"
            )));
        }

        response
            .json::<TokenGrant>()
            .await
            .map_err(|e| AppError::provider_exchange(format!("Malformed token response: {e}")))
    }
}

#[async_trait]
impl TokenEndpointClient for HttpTokenClient {
    async fn exchange_code(
        &self,
        settings: &ProviderSettings,
        code: &str,
    ) -> Result<TokenGrant, AppError> {
        self.post_grant(
            &settings.token_url,
            &[
                ("client_id", settings.client_id.as_str()),
                ("client_secret", settings.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", settings.redirect_uri.as_str()),
            ],
        )
        .await
    }

    async fn refresh_token(
        &self,
        settings: &ProviderSettings,
        refresh_token: &str,
    ) -> Result<TokenGrant, AppError> {
        self.post_grant(
            &settings.token_url,
            &[
                ("client_id", settings.client_id.as_str()),
                ("client_secret", settings.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ],
        )
        .await
    }
}
