//! OAuth provider configuration.
//!
//! Client credentials are configuration data and are never embedded in
//! source; each provider section is loaded from the TOML files or the
//! `SKYVAULT__OAUTH__...` environment overlay.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// OAuth settings for all providers plus the refresh policy knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// Per-provider settings keyed by provider name (`gdrive`, `proton`).
    /// A provider without an entry here cannot start an authorization flow.
    #[serde(default)]
    pub providers: HashMap<String, ProviderSettings>,
    /// How close to expiry (seconds) a stored access token must be before
    /// a lazy refresh is attempted.
    #[serde(default = "default_refresh_lookahead")]
    pub refresh_lookahead_seconds: i64,
    /// Assumed token lifetime (seconds) when a provider response omits
    /// `expires_in`.
    #[serde(default = "default_token_ttl")]
    pub default_token_ttl_seconds: i64,
    /// Bounded timeout (seconds) for calls to provider token endpoints.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            refresh_lookahead_seconds: default_refresh_lookahead(),
            default_token_ttl_seconds: default_token_ttl(),
            http_timeout_seconds: default_http_timeout(),
        }
    }
}

impl OAuthConfig {
    /// Look up the settings for a provider by its name.
    pub fn provider(&self, name: &str) -> Option<&ProviderSettings> {
        self.providers.get(name)
    }
}

/// OAuth endpoints and client credentials for a single provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Authorization (user consent) endpoint URL.
    pub auth_url: String,
    /// Token endpoint URL.
    pub token_url: String,
    /// Space-delimited scope string requested at authorization.
    pub scope: String,
    /// Redirect URI registered with the provider.
    pub redirect_uri: String,
}

fn default_refresh_lookahead() -> i64 {
    300
}

fn default_token_ttl() -> i64 {
    3600
}

fn default_http_timeout() -> u64 {
    30
}
