//! The user document-store contract.
//!
//! Every component that needs persistence receives an `Arc<dyn UserStore>`
//! through its constructor; nothing reaches for a shared global handle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use skyvault_core::AppResult;
use skyvault_entity::oauth::ProviderTokenRecord;
use skyvault_entity::user::{NewUser, ProfileUpdate, User};

/// Persistence operations over user identity records.
///
/// The contract is that of a simple document store: lookups by unique
/// field, whole-record insert, partial field updates, and nested updates
/// of a single provider's token record. No transactions are assumed.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by primary key.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by username.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Find a user by email address.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Insert a new user. Fails with `DuplicateIdentity` when the username
    /// or email is already taken.
    async fn insert(&self, data: &NewUser) -> AppResult<User>;

    /// Update profile fields, leaving unset fields untouched.
    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> AppResult<User>;

    /// Replace the stored password hash.
    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()>;

    /// Record a successful login.
    async fn update_last_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;

    /// Activate or deactivate the account.
    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<()>;

    /// Store or replace the token record for one provider, leaving the
    /// rest of the provider map untouched.
    async fn put_provider_tokens(
        &self,
        id: Uuid,
        provider: &str,
        record: &ProviderTokenRecord,
    ) -> AppResult<()>;

    /// Remove one provider's token record. Returns whether a record
    /// existed.
    async fn remove_provider_tokens(&self, id: Uuid, provider: &str) -> AppResult<bool>;
}
