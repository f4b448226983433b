//! # skyvault-auth
//!
//! The token lifecycle core of Skyvault: session token issuance and
//! verification, password hashing, identity resolution, and the OAuth
//! provider token store with lazy refresh.
//!
//! ## Modules
//!
//! - `jwt` — session token creation and validation (HS256)
//! - `password` — Argon2id password hashing
//! - `gate` — token-to-identity resolution for protected operations
//! - `session` — signup, login, and token refresh flows
//! - `oauth` — per-provider OAuth token records and refresh-on-demand

pub mod gate;
pub mod jwt;
pub mod oauth;
pub mod password;
pub mod session;

pub use gate::AuthGate;
pub use jwt::{Claims, JwtDecoder, JwtEncoder, TokenPair, TokenType};
pub use oauth::{HttpTokenClient, OAuthTokenManager, TokenEndpointClient};
pub use password::PasswordHasher;
pub use session::SessionManager;
