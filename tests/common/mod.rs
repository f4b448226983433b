//! Shared test helpers for integration tests.
//!
//! The full router is exercised over the in-memory user repository and a
//! scripted token-endpoint client, so the suite needs neither a database
//! nor network access.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use skyvault_api::{build_state, router::build_router};
use skyvault_auth::oauth::{TokenEndpointClient, TokenGrant};
use skyvault_core::config::{AppConfig, AuthConfig, ProviderSettings};
use skyvault_core::error::AppError;
use skyvault_database::UserStore;
use skyvault_database::repositories::MemoryUserRepository;

/// Token endpoint stand-in that replays scripted responses.
#[derive(Default)]
pub struct ScriptedTokenClient {
    responses: Mutex<VecDeque<Result<TokenGrant, AppError>>>,
    pub exchange_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
}

impl ScriptedTokenClient {
    pub fn push_grant(&self, access: &str, refresh: Option<&str>, expires_in: Option<i64>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(TokenGrant {
                access_token: access.to_string(),
                refresh_token: refresh.map(str::to_string),
                expires_in,
                scope: Some("drive.read drive.write".to_string()),
            }));
    }

    pub fn push_failure(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(AppError::provider_exchange(message)));
    }

    fn next(&self) -> Result<TokenGrant, AppError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted token response left")
    }
}

#[async_trait::async_trait]
impl TokenEndpointClient for ScriptedTokenClient {
    async fn exchange_code(
        &self,
        _settings: &ProviderSettings,
        _code: &str,
    ) -> Result<TokenGrant, AppError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        self.next()
    }

    async fn refresh_token(
        &self,
        _settings: &ProviderSettings,
        _refresh_token: &str,
    ) -> Result<TokenGrant, AppError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.next()
    }
}

/// A decoded response from the test router.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Direct handle on the user store
    pub users: Arc<MemoryUserRepository>,
    /// Scripted provider token endpoint
    pub token_client: Arc<ScriptedTokenClient>,
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        let mut config = AppConfig {
            auth: AuthConfig {
                jwt_secret: "integration-test-secret".to_string(),
                // Minimal hashing cost keeps the suite fast.
                argon2_memory_kib: 1024,
                argon2_iterations: 1,
                argon2_parallelism: 1,
                ..AuthConfig::default()
            },
            ..AppConfig::default()
        };

        for name in ["gdrive", "proton"] {
            config.oauth.providers.insert(
                name.to_string(),
                ProviderSettings {
                    client_id: "test-client-id".to_string(),
                    client_secret: "test-client-secret".to_string(),
                    auth_url: format!("https://{name}.example.com/oauth/authorize"),
                    token_url: format!("https://{name}.example.com/oauth/token"),
                    scope: "drive.read drive.write".to_string(),
                    redirect_uri: "https://app.example.com/auth/callback".to_string(),
                },
            );
        }

        let users = Arc::new(MemoryUserRepository::new());
        let token_client = Arc::new(ScriptedTokenClient::default());

        let state = build_state(
            config,
            Arc::clone(&users) as Arc<dyn UserStore>,
            Arc::clone(&token_client) as Arc<dyn TokenEndpointClient>,
        )
        .expect("failed to build test state");

        Self {
            router: build_router(state),
            users,
            token_client,
        }
    }

    /// Send a request through the router and decode the JSON response.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    /// Register a user and return the signup response body.
    pub async fn signup(&self, username: &str, email: &str, password: &str) -> TestResponse {
        self.request(
            "POST",
            "/api/auth/signup",
            Some(serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
            })),
            None,
        )
        .await
    }

    /// Log in and return the access token.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/auth/login",
                Some(serde_json::json!({
                    "username": username,
                    "password": password,
                })),
                None,
            )
            .await;

        assert_eq!(response.status, StatusCode::OK, "login failed");
        response.body["access_token"]
            .as_str()
            .expect("no access token in login response")
            .to_string()
    }
}
