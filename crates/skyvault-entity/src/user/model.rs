//! User entity model.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::oauth::ProviderTokenRecord;

/// A registered user in the Skyvault system.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique login name.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Human-readable display name.
    pub display_name: Option<String>,
    /// Whether the account may authenticate.
    pub is_active: bool,
    /// Connected OAuth provider tokens, keyed by provider name.
    #[sqlx(json)]
    pub oauth_accounts: HashMap<String, ProviderTokenRecord>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Returns the token record for a provider, if one is stored.
    pub fn provider_tokens(&self, provider: &str) -> Option<&ProviderTokenRecord> {
        self.oauth_accounts.get(provider)
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Display name (optional).
    pub display_name: Option<String>,
}

/// Data for updating an existing user's profile.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfileUpdate {
    /// New email address.
    pub email: Option<String>,
    /// New display name.
    pub display_name: Option<String>,
}
