//! Stored OAuth token record for one (user, provider) pair.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// OAuth tokens held on behalf of a user for a single provider.
///
/// Embedded in the user row's provider map. A record without an
/// `expires_at` never expires and is never refreshed; a record without a
/// `refresh_token` cannot be refreshed at all.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderTokenRecord {
    /// The access token presented to the provider's APIs.
    pub access_token: String,
    /// The refresh token, when the provider issued one.
    pub refresh_token: Option<String>,
    /// Absolute expiry of the access token (UTC).
    pub expires_at: Option<DateTime<Utc>>,
    /// Granted scope strings.
    pub scopes: Vec<String>,
}

impl ProviderTokenRecord {
    /// Whether the access token expires within the given lookahead window.
    ///
    /// A record with no expiry never reports as expiring.
    pub fn is_expiring_within(&self, lookahead_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= Utc::now() + Duration::seconds(lookahead_seconds),
            None => false,
        }
    }

    /// Whether the record carries a refresh token.
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }
}

// Token material must never reach logs.
impl fmt::Debug for ProviderTokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderTokenRecord")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}
