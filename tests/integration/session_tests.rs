//! Login and session validation integration tests.
//!
//! Tests verify:
//! - Successful login returns a token and a Z-suffixed expiry
//! - Wrong credentials return 401 and create no session
//! - Tokens validate until expiry, then report expiry once and vanish

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use questboard::session::SessionStore;

use super::test_utils::{json_request, raw_request, TestApp, ADMIN_SECRET};

async fn seed_user(app: &TestApp, username: &str, password: &str) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-ADMIN-SECRET", ADMIN_SECRET)
        .body(Body::from(
            json!({"username": username, "password": password}).to_string(),
        ))
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
}

async fn login(app: &TestApp, username: &str, password: &str) -> (StatusCode, serde_json::Value) {
    app.send(json_request(
        Method::POST,
        "/login",
        &json!({"username": username, "password": password}),
    ))
    .await
}

async fn validate(app: &TestApp, token: &str) -> (StatusCode, serde_json::Value) {
    app.send(json_request(
        Method::POST,
        "/validate-session",
        &json!({"token": token}),
    ))
    .await
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::new();
    seed_user(&app, "alice", "pw").await;
    let before = Utc::now();

    let (status, body) = login(&app, "alice", "pw").await;
    assert_eq!(status, StatusCode::OK);

    let token = body["token"].as_str().unwrap();
    assert!(token.len() >= 43);
    assert!(token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

    let expiry_text = body["expiry"].as_str().unwrap();
    assert!(expiry_text.ends_with('Z'));
    let expiry = DateTime::parse_from_rfc3339(expiry_text)
        .unwrap()
        .with_timezone(&Utc);
    assert!(expiry >= before + Duration::minutes(30) - Duration::seconds(1));
    assert!(expiry <= Utc::now() + Duration::minutes(30));
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = TestApp::new();
    seed_user(&app, "alice", "pw").await;

    let (status, body) = login(&app, "alice", "nope").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Invalid username or password"}));
}

#[tokio::test]
async fn test_login_unknown_user() {
    let app = TestApp::new();
    let (status, body) = login(&app, "ghost", "pw").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Invalid username or password"}));
}

#[tokio::test]
async fn test_login_missing_fields() {
    let app = TestApp::new();
    let (status, body) = app
        .send(json_request(Method::POST, "/login", &json!({"username": "alice"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "username and password required"}));
}

#[tokio::test]
async fn test_login_malformed_body() {
    let app = TestApp::new();
    let (status, _) = app
        .send(raw_request(Method::POST, "/login", "application/json", "{"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_validate_live_session() {
    let app = TestApp::new();
    seed_user(&app, "alice", "pw").await;
    let (_, body) = login(&app, "alice", "pw").await;
    let token = body["token"].as_str().unwrap();

    for _ in 0..2 {
        let (status, body) = validate(&app, token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"valid": true, "username": "alice"}));
    }
}

#[tokio::test]
async fn test_validate_unknown_token() {
    let app = TestApp::new();
    let (status, body) = validate(&app, "not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"valid": false, "reason": "Invalid session"}));
}

#[tokio::test]
async fn test_validate_missing_token() {
    let app = TestApp::new();
    let (status, body) = app
        .send(json_request(Method::POST, "/validate-session", &json!({})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"valid": false, "reason": "Invalid session"}));
}

#[tokio::test]
async fn test_expired_session_reported_once() {
    let app = TestApp::builder()
        .sessions(SessionStore::with_ttl(Duration::zero()))
        .build();
    seed_user(&app, "alice", "pw").await;
    let (status, body) = login(&app, "alice", "pw").await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();

    let (status, body) = validate(&app, token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"valid": false, "reason": "Session expired"}));

    let (status, body) = validate(&app, token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"valid": false, "reason": "Invalid session"}));
}

#[tokio::test]
async fn test_failed_login_creates_no_session() {
    let app = TestApp::new();
    seed_user(&app, "alice", "pw").await;

    let (status, body) = login(&app, "alice", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("token").is_none());
    assert!(app.state.sessions.is_empty().await);

    login(&app, "alice", "pw").await;
    assert_eq!(app.state.sessions.len().await, 1);
}
