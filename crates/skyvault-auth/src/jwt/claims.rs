//! Session token claims structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims payload carried by every session token.
///
/// The wire format is fixed: `sub` (username), `user_id`, `exp` (epoch
/// seconds), and `type`. Validity derives entirely from the signature and
/// the expiry claim; nothing is stored server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — the username.
    pub sub: String,
    /// The user's unique identifier.
    pub user_id: Uuid,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Token kind: access or refresh.
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

/// Distinguishes access tokens from refresh tokens.
///
/// An access token is never accepted where a refresh token is required,
/// and vice versa.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived token for API requests.
    Access,
    /// Long-lived token used solely to mint new access tokens.
    Refresh,
}

impl Claims {
    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }

    /// Checks whether this token has expired. The expiry instant itself
    /// counts as expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}
