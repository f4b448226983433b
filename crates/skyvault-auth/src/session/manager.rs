//! Session lifecycle manager — signup, login, and refresh flows.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use skyvault_core::error::AppError;
use skyvault_database::UserStore;
use skyvault_entity::user::{NewUser, User};

use crate::jwt::encoder::TokenPair;
use crate::jwt::{JwtDecoder, JwtEncoder, TokenType};
use crate::password::PasswordHasher;

/// Data accepted at signup.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SignupData {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Plaintext password (hashed before storage, never logged).
    pub password: String,
    /// Display name (optional).
    pub display_name: Option<String>,
}

/// Result of a successful signup or login.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LoginResult {
    /// Generated token pair.
    pub tokens: TokenPair,
    /// The authenticated user.
    pub user: User,
}

/// A freshly minted access token, as returned by the refresh flow.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AccessToken {
    /// The token string.
    pub token: String,
    /// When it expires.
    pub expires_at: DateTime<Utc>,
}

/// Manages the account and session-token lifecycle.
///
/// Tokens are stateless: there is no revocation list, so a logout before
/// expiry is not possible server-side.
#[derive(Clone)]
pub struct SessionManager {
    /// User persistence.
    users: Arc<dyn UserStore>,
    /// Password hasher.
    hasher: Arc<PasswordHasher>,
    /// Token issuance.
    encoder: Arc<JwtEncoder>,
    /// Token validation.
    decoder: Arc<JwtDecoder>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish()
    }
}

impl SessionManager {
    /// Creates a new session manager with all required dependencies.
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<PasswordHasher>,
        encoder: Arc<JwtEncoder>,
        decoder: Arc<JwtDecoder>,
    ) -> Self {
        Self {
            users,
            hasher,
            encoder,
            decoder,
        }
    }

    /// Registers a new user and issues their first token pair.
    ///
    /// 1. Reject a taken username or email (no insert is attempted)
    /// 2. Hash the password
    /// 3. Insert the identity record
    /// 4. Issue access + refresh tokens
    pub async fn signup(&self, data: SignupData) -> Result<LoginResult, AppError> {
        // Step 1: Uniqueness checks. The store's unique constraints are
        // the backstop for concurrent signups.
        if self
            .users
            .find_by_username(&data.username)
            .await?
            .is_some()
        {
            return Err(AppError::duplicate_identity(format!(
                "Username '{}' already exists",
                data.username
            )));
        }
        if self.users.find_by_email(&data.email).await?.is_some() {
            return Err(AppError::duplicate_identity("Email already in use"));
        }

        // Step 2: Hash the password.
        let password_hash = self.hasher.hash_password(&data.password)?;

        // Step 3: Insert.
        let user = self
            .users
            .insert(&NewUser {
                username: data.username,
                email: data.email,
                password_hash,
                display_name: data.display_name,
            })
            .await?;

        // Step 4: Issue tokens.
        let tokens = self.encoder.issue_pair(&user.username, user.id)?;

        info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(LoginResult { tokens, user })
    }

    /// Authenticates a user by username and password.
    ///
    /// Unknown username and wrong password are indistinguishable to the
    /// caller.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AppError> {
        // Step 1: Find the user.
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::invalid_credentials("Invalid username or password"))?;

        // Step 2: Verify the password.
        let password_valid = self.hasher.verify_password(password, &user.password_hash)?;
        if !password_valid {
            return Err(AppError::invalid_credentials("Invalid username or password"));
        }

        // Step 3: Record the login.
        let now = Utc::now();
        self.users.update_last_login(user.id, now).await?;

        // Step 4: Issue tokens.
        let tokens = self.encoder.issue_pair(&user.username, user.id)?;

        info!(user_id = %user.id, username = %user.username, "Login successful");

        Ok(LoginResult {
            tokens,
            user: User {
                last_login_at: Some(now),
                ..user
            },
        })
    }

    /// Mints a new access token from a valid refresh token.
    ///
    /// The refresh token itself is not rotated: it stays valid until its
    /// own expiry. Presenting anything but a refresh-kind token fails
    /// with `InvalidToken`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessToken, AppError> {
        let claims = self.decoder.verify(refresh_token, TokenType::Refresh)?;

        let (token, expires_at) = self.encoder.issue_access(&claims.sub, claims.user_id)?;

        info!(username = %claims.sub, "Access token refreshed");

        Ok(AccessToken { token, expires_at })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyvault_core::config::AuthConfig;
    use skyvault_core::error::ErrorKind;
    use skyvault_database::repositories::MemoryUserRepository;

    fn manager() -> SessionManager {
        let config = AuthConfig {
            jwt_secret: "session-test-secret".to_string(),
            argon2_memory_kib: 1024,
            argon2_iterations: 1,
            argon2_parallelism: 1,
            ..AuthConfig::default()
        };
        SessionManager::new(
            Arc::new(MemoryUserRepository::new()),
            Arc::new(PasswordHasher::new(&config).unwrap()),
            Arc::new(JwtEncoder::new(&config)),
            Arc::new(JwtDecoder::new(&config)),
        )
    }

    fn signup_data(username: &str, email: &str) -> SignupData {
        SignupData {
            username: username.to_string(),
            email: email.to_string(),
            password: "pw123".to_string(),
            display_name: Some("Alice".to_string()),
        }
    }

    #[tokio::test]
    async fn signup_then_login_round_trip() {
        let manager = manager();

        let signed_up = manager
            .signup(signup_data("alice", "alice@x.com"))
            .await
            .unwrap();
        assert!(!signed_up.tokens.access_token.is_empty());
        assert!(!signed_up.tokens.refresh_token.is_empty());

        let logged_in = manager.login("alice", "pw123").await.unwrap();
        assert_eq!(logged_in.user.id, signed_up.user.id);
        assert!(logged_in.user.last_login_at.is_some());
    }

    #[tokio::test]
    async fn login_failures_are_invalid_credentials() {
        let manager = manager();
        manager
            .signup(signup_data("alice", "alice@x.com"))
            .await
            .unwrap();

        let err = manager.login("alice", "wrong").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidCredentials);

        let err = manager.login("nobody", "pw123").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidCredentials);
    }

    #[tokio::test]
    async fn duplicate_signup_is_rejected_before_insert() {
        let manager = manager();
        manager
            .signup(signup_data("alice", "alice@x.com"))
            .await
            .unwrap();

        let err = manager
            .signup(signup_data("alice", "fresh@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateIdentity);

        let err = manager
            .signup(signup_data("bob", "alice@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateIdentity);

        // The losing signup must not have left a record behind.
        assert!(manager.login("bob", "pw123").await.is_err());
    }

    #[tokio::test]
    async fn refresh_mints_a_verifiable_access_token() {
        let manager = manager();
        let result = manager
            .signup(signup_data("alice", "alice@x.com"))
            .await
            .unwrap();

        let minted = manager
            .refresh(&result.tokens.refresh_token)
            .await
            .unwrap();

        let claims = manager
            .decoder
            .verify(&minted.token, TokenType::Access)
            .unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.user_id, result.user.id);
    }

    #[tokio::test]
    async fn refresh_rejects_an_access_token() {
        let manager = manager();
        let result = manager
            .signup(signup_data("alice", "alice@x.com"))
            .await
            .unwrap();

        let err = manager
            .refresh(&result.tokens.access_token)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }

    #[tokio::test]
    async fn refresh_token_remains_valid_after_use() {
        let manager = manager();
        let result = manager
            .signup(signup_data("alice", "alice@x.com"))
            .await
            .unwrap();

        manager.refresh(&result.tokens.refresh_token).await.unwrap();
        // Rotation is deliberately absent: a second use still succeeds.
        manager.refresh(&result.tokens.refresh_token).await.unwrap();
    }
}
