//! Integration tests for the OAuth provider token lifecycle.

mod common;

use std::sync::atomic::Ordering;

use axum::http::StatusCode;
use common::TestApp;
use skyvault_database::UserStore;

#[tokio::test]
async fn authorize_returns_a_consent_url_with_state() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/auth/oauth/gdrive", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    let auth_url = response.body["auth_url"].as_str().unwrap();
    let state = response.body["state"].as_str().unwrap();
    assert!(auth_url.starts_with("https://gdrive.example.com/oauth/authorize"));
    assert!(auth_url.contains("client_id=test-client-id"));
    assert!(auth_url.contains("response_type=code"));
    assert!(auth_url.contains(&format!("state={state}")));
}

#[tokio::test]
async fn authorize_rejects_unknown_and_non_oauth_providers() {
    let app = TestApp::new();

    let response = app
        .request("GET", "/api/auth/oauth/dropbox", None, None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "UNSUPPORTED_PROVIDER");

    let response = app
        .request("GET", "/api/auth/oauth/terabox", None, None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "UNSUPPORTED_PROVIDER");
}

#[tokio::test]
async fn callback_requires_an_authenticated_user() {
    let app = TestApp::new();

    let response = app
        .request(
            "GET",
            "/api/auth/callback/gdrive?code=auth-code&state=xyz",
            None,
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn callback_exchanges_the_code_and_stores_the_record() {
    let app = TestApp::new();
    app.signup("alice", "alice@x.com", "pw123").await;
    let token = app.login("alice", "pw123").await;

    app.token_client
        .push_grant("provider-access", Some("provider-refresh"), Some(3600));

    let response = app
        .request(
            "GET",
            "/api/auth/callback/gdrive?code=auth-code&state=xyz",
            None,
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["provider"], "gdrive");
    assert!(response.body["expires_at"].is_string());
    assert_eq!(app.token_client.exchange_calls.load(Ordering::SeqCst), 1);

    let user = app.users.find_by_username("alice").await.unwrap().unwrap();
    let record = user.provider_tokens("gdrive").unwrap();
    assert_eq!(record.access_token, "provider-access");
    assert_eq!(record.refresh_token.as_deref(), Some("provider-refresh"));
    assert_eq!(record.scopes, vec!["drive.read", "drive.write"]);
}

#[tokio::test]
async fn callback_surfaces_a_failed_exchange() {
    let app = TestApp::new();
    app.signup("alice", "alice@x.com", "pw123").await;
    let token = app.login("alice", "pw123").await;

    app.token_client.push_failure("endpoint returned 400");

    let response = app
        .request(
            "GET",
            "/api/auth/callback/gdrive?code=bad-code&state=xyz",
            None,
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body["error"], "PROVIDER_EXCHANGE_FAILED");

    let user = app.users.find_by_username("alice").await.unwrap().unwrap();
    assert!(user.provider_tokens("gdrive").is_none());
}

#[tokio::test]
async fn status_reports_connections_per_provider() {
    let app = TestApp::new();
    app.signup("alice", "alice@x.com", "pw123").await;
    let token = app.login("alice", "pw123").await;

    let response = app
        .request("GET", "/api/auth/oauth/status", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["gdrive"]["connected"], false);
    assert_eq!(response.body["proton"]["connected"], false);

    app.token_client.push_grant("tok", Some("rt"), Some(3600));
    app.request(
        "GET",
        "/api/auth/callback/gdrive?code=auth-code&state=xyz",
        None,
        Some(&token),
    )
    .await;

    let response = app
        .request("GET", "/api/auth/oauth/status", None, Some(&token))
        .await;
    assert_eq!(response.body["gdrive"]["connected"], true);
    assert_eq!(response.body["proton"]["connected"], false);
}

#[tokio::test]
async fn disconnect_removes_the_stored_record() {
    let app = TestApp::new();
    app.signup("alice", "alice@x.com", "pw123").await;
    let token = app.login("alice", "pw123").await;

    app.token_client.push_grant("tok", Some("rt"), Some(3600));
    app.request(
        "GET",
        "/api/auth/callback/gdrive?code=auth-code&state=xyz",
        None,
        Some(&token),
    )
    .await;

    let response = app
        .request("DELETE", "/api/auth/oauth/gdrive", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let user = app.users.find_by_username("alice").await.unwrap().unwrap();
    assert!(user.provider_tokens("gdrive").is_none());
}
