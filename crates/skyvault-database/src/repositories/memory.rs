//! In-memory user repository.
//!
//! Backs the unit and integration test suites so the auth flows can be
//! exercised without a PostgreSQL instance. Mirrors the behavior of
//! [`super::user::UserRepository`], including duplicate-identity mapping.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use skyvault_core::AppError;
use skyvault_core::result::AppResult;
use skyvault_entity::oauth::ProviderTokenRecord;
use skyvault_entity::user::{NewUser, ProfileUpdate, User};

use crate::store::UserStore;

/// Process-local user store over a guarded map.
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_user<T>(&self, id: Uuid, f: impl FnOnce(&mut User) -> T) -> AppResult<T> {
        let mut users = self.users.write().expect("user map lock poisoned");
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        Ok(f(user))
    }
}

#[async_trait]
impl UserStore for MemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let users = self.users.read().expect("user map lock poisoned");
        Ok(users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let users = self.users.read().expect("user map lock poisoned");
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.read().expect("user map lock poisoned");
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, data: &NewUser) -> AppResult<User> {
        let mut users = self.users.write().expect("user map lock poisoned");

        if users.values().any(|u| u.username == data.username) {
            return Err(AppError::duplicate_identity(format!(
                "Username '{}' already exists",
                data.username
            )));
        }
        if users.values().any(|u| u.email == data.email) {
            return Err(AppError::duplicate_identity("Email already in use"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: data.username.clone(),
            email: data.email.clone(),
            password_hash: data.password_hash.clone(),
            display_name: data.display_name.clone(),
            is_active: true,
            oauth_accounts: HashMap::new(),
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> AppResult<User> {
        if let Some(email) = &update.email {
            let users = self.users.read().expect("user map lock poisoned");
            if users.values().any(|u| u.id != id && &u.email == email) {
                return Err(AppError::duplicate_identity("Email already in use"));
            }
        }

        self.with_user(id, |user| {
            if let Some(email) = &update.email {
                user.email = email.clone();
            }
            if let Some(display_name) = &update.display_name {
                user.display_name = Some(display_name.clone());
            }
            user.updated_at = Utc::now();
            user.clone()
        })
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        self.with_user(id, |user| {
            user.password_hash = password_hash.to_string();
            user.updated_at = Utc::now();
        })
    }

    async fn update_last_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        self.with_user(id, |user| {
            user.last_login_at = Some(at);
            user.updated_at = Utc::now();
        })
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<()> {
        self.with_user(id, |user| {
            user.is_active = is_active;
            user.updated_at = Utc::now();
        })
    }

    async fn put_provider_tokens(
        &self,
        id: Uuid,
        provider: &str,
        record: &ProviderTokenRecord,
    ) -> AppResult<()> {
        self.with_user(id, |user| {
            user.oauth_accounts
                .insert(provider.to_string(), record.clone());
            user.updated_at = Utc::now();
        })
    }

    async fn remove_provider_tokens(&self, id: Uuid, provider: &str) -> AppResult<bool> {
        self.with_user(id, |user| {
            let removed = user.oauth_accounts.remove(provider).is_some();
            if removed {
                user.updated_at = Utc::now();
            }
            removed
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyvault_core::error::ErrorKind;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            display_name: None,
        }
    }

    #[tokio::test]
    async fn insert_and_find() {
        let repo = MemoryUserRepository::new();
        let user = repo.insert(&new_user("alice", "alice@x.com")).await.unwrap();

        let by_name = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        let by_email = repo.find_by_email("alice@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert!(repo.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_rejected() {
        let repo = MemoryUserRepository::new();
        repo.insert(&new_user("alice", "alice@x.com")).await.unwrap();

        let err = repo
            .insert(&new_user("alice", "other@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateIdentity);

        let err = repo
            .insert(&new_user("alice2", "alice@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateIdentity);
    }

    #[tokio::test]
    async fn provider_tokens_round_trip() {
        let repo = MemoryUserRepository::new();
        let user = repo.insert(&new_user("alice", "alice@x.com")).await.unwrap();

        let record = ProviderTokenRecord {
            access_token: "tok".to_string(),
            refresh_token: None,
            expires_at: None,
            scopes: vec!["drive".to_string()],
        };
        repo.put_provider_tokens(user.id, "gdrive", &record)
            .await
            .unwrap();

        let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.provider_tokens("gdrive"), Some(&record));

        assert!(repo.remove_provider_tokens(user.id, "gdrive").await.unwrap());
        assert!(!repo.remove_provider_tokens(user.id, "gdrive").await.unwrap());
    }
}
