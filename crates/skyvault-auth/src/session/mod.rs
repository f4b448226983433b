//! Signup, login, and token refresh flows.

pub mod manager;

pub use manager::{AccessToken, LoginResult, SessionManager, SignupData};
