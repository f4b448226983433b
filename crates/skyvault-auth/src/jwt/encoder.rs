//! Session token creation with configurable signing and TTL.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use skyvault_core::config::AuthConfig;
use skyvault_core::error::AppError;

use super::claims::{Claims, TokenType};

/// Creates signed access and refresh tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Access token TTL in minutes.
    access_ttl_minutes: i64,
    /// Refresh token TTL in days.
    refresh_ttl_days: i64,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .finish()
    }
}

/// Result of a successful token pair generation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// Access token expiration timestamp.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiration timestamp.
    pub refresh_expires_at: DateTime<Utc>,
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl_minutes: config.jwt_access_ttl_minutes as i64,
            refresh_ttl_days: config.jwt_refresh_ttl_days as i64,
        }
    }

    /// Issues an access token for the given subject.
    pub fn issue_access(
        &self,
        username: &str,
        user_id: Uuid,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let expires_at = Utc::now() + Duration::minutes(self.access_ttl_minutes);
        let token = self.sign(username, user_id, expires_at, TokenType::Access)?;
        Ok((token, expires_at))
    }

    /// Issues a refresh token for the given subject.
    pub fn issue_refresh(
        &self,
        username: &str,
        user_id: Uuid,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let expires_at = Utc::now() + Duration::days(self.refresh_ttl_days);
        let token = self.sign(username, user_id, expires_at, TokenType::Refresh)?;
        Ok((token, expires_at))
    }

    /// Issues an access + refresh token pair, as handed out at signup and
    /// login.
    pub fn issue_pair(&self, username: &str, user_id: Uuid) -> Result<TokenPair, AppError> {
        let (access_token, access_expires_at) = self.issue_access(username, user_id)?;
        let (refresh_token, refresh_expires_at) = self.issue_refresh(username, user_id)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }

    fn sign(
        &self,
        username: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
        token_type: TokenType,
    ) -> Result<String, AppError> {
        let claims = Claims {
            sub: username.to_string(),
            user_id,
            exp: expires_at.timestamp(),
            token_type,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))
    }
}
