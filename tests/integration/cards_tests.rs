//! Card endpoint integration tests.
//!
//! Tests verify:
//! - Create without id (201) and upsert with id (200, full replace)
//! - Category defaulting and lastModified stamping
//! - Partial updates merge into the stored card
//! - Deletes are idempotent
//! - Malformed bodies and store failures map to JSON errors

use axum::http::{Method, StatusCode};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use questboard::resources::cards::CARDS_COLLECTION;

use super::test_utils::{
    empty_request, failing_store_router, get, json_request, raw_request, send, TestApp,
};

fn parse_time(value: &Value) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value.as_str().unwrap())
        .unwrap()
        .with_timezone(&Utc)
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_card_returns_201_and_id() {
    let app = TestApp::new();
    let before = Utc::now();

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/cards",
            &json!({"title": "Slay the wyrm", "reward": 50}),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_str().unwrap();
    assert!(!id.is_empty());

    let stored = app.store.get(CARDS_COLLECTION, id).await.unwrap();
    assert_eq!(stored["title"], "Slay the wyrm");
    assert_eq!(stored["reward"], 50);
    assert_eq!(stored["category"], "Uncategorized");
    assert!(parse_time(&stored["lastModified"]) >= before);
}

#[tokio::test]
async fn test_create_card_keeps_category() {
    let app = TestApp::new();
    let (_, body) = app
        .send(json_request(
            Method::POST,
            "/cards",
            &json!({"title": "x", "category": "Main"}),
        ))
        .await;

    let stored = app
        .store
        .get(CARDS_COLLECTION, body["id"].as_str().unwrap())
        .await
        .unwrap();
    assert_eq!(stored["category"], "Main");
}

#[tokio::test]
async fn test_create_card_with_empty_category() {
    let app = TestApp::new();
    let (_, body) = app
        .send(json_request(
            Method::POST,
            "/cards",
            &json!({"title": "x", "category": ""}),
        ))
        .await;

    let stored = app
        .store
        .get(CARDS_COLLECTION, body["id"].as_str().unwrap())
        .await
        .unwrap();
    assert_eq!(stored["category"], "Uncategorized");
}

#[tokio::test]
async fn test_create_card_with_id_upserts() {
    let app = TestApp::new();

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/cards",
            &json!({"id": "c-1", "title": "First", "reward": 10}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": "c-1"}));

    // A second upsert replaces the whole document
    let (status, _) = app
        .send(json_request(
            Method::POST,
            "/cards",
            &json!({"id": "c-1", "title": "Second"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let stored = app.store.get(CARDS_COLLECTION, "c-1").await.unwrap();
    assert_eq!(stored["title"], "Second");
    assert!(!stored.contains_key("reward"));
    assert!(!stored.contains_key("id"));
    assert_eq!(app.store.count(CARDS_COLLECTION).await, 1);
}

#[tokio::test]
async fn test_create_card_with_numeric_id_is_rejected() {
    let app = TestApp::new();
    let (status, body) = app
        .send(json_request(Method::POST, "/cards", &json!({"id": 12})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "id must be a string");
}

#[tokio::test]
async fn test_create_card_with_malformed_json() {
    let app = TestApp::new();
    let (status, body) = app
        .send(raw_request(
            Method::POST,
            "/cards",
            "application/json",
            "{\"title\": ",
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_create_card_with_non_object_body() {
    let app = TestApp::new();
    let (status, body) = app
        .send(json_request(Method::POST, "/cards", &json!(["not", "a", "card"])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

// =============================================================================
// List
// =============================================================================

#[tokio::test]
async fn test_list_cards_includes_ids() {
    let app = TestApp::new();
    for title in ["a", "b"] {
        app.send(json_request(Method::POST, "/cards", &json!({"title": title})))
            .await;
    }

    let (status, body) = app.send(get("/cards")).await;
    assert_eq!(status, StatusCode::OK);

    let cards = body.as_array().unwrap();
    assert_eq!(cards.len(), 2);
    for card in cards {
        assert!(card["id"].is_string());
        assert_eq!(card["category"], "Uncategorized");
    }
}

#[tokio::test]
async fn test_list_cards_empty() {
    let app = TestApp::new();
    let (status, body) = app.send(get("/cards")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

// =============================================================================
// Update & Delete
// =============================================================================

#[tokio::test]
async fn test_update_card_merges() {
    let app = TestApp::new();
    app.send(json_request(
        Method::POST,
        "/cards",
        &json!({"id": "c-1", "title": "Old", "reward": 10, "category": "Main"}),
    ))
    .await;
    let before = app.store.get(CARDS_COLLECTION, "c-1").await.unwrap();

    let (status, body) = app
        .send(json_request(
            Method::PUT,
            "/cards/c-1",
            &json!({"title": "New", "category": "Side"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let stored = app.store.get(CARDS_COLLECTION, "c-1").await.unwrap();
    assert_eq!(stored["title"], "New");
    assert_eq!(stored["reward"], 10);
    assert_eq!(stored["category"], "Side");
    assert!(parse_time(&stored["lastModified"]) >= parse_time(&before["lastModified"]));
}

#[tokio::test]
async fn test_update_card_merges_nested_fields() {
    let app = TestApp::new();
    app.send(json_request(
        Method::POST,
        "/cards",
        &json!({"id": "c-1", "meta": {"author": "ann", "version": 1}}),
    ))
    .await;

    app.send(json_request(
        Method::PUT,
        "/cards/c-1",
        &json!({"meta": {"version": 2}}),
    ))
    .await;

    let stored = app.store.get(CARDS_COLLECTION, "c-1").await.unwrap();
    assert_eq!(stored["meta"], json!({"author": "ann", "version": 2}));
}

#[tokio::test]
async fn test_update_missing_card_creates_it() {
    let app = TestApp::new();
    let (status, _) = app
        .send(json_request(Method::PUT, "/cards/new-card", &json!({"title": "t"})))
        .await;
    assert_eq!(status, StatusCode::OK);

    let stored = app.store.get(CARDS_COLLECTION, "new-card").await.unwrap();
    assert_eq!(stored["title"], "t");
    assert_eq!(stored["category"], "Uncategorized");
}

#[tokio::test]
async fn test_delete_card_is_idempotent() {
    let app = TestApp::new();
    app.send(json_request(
        Method::POST,
        "/cards",
        &json!({"id": "c-1", "title": "t"}),
    ))
    .await;

    for _ in 0..2 {
        let (status, body) = app.send(empty_request(Method::DELETE, "/cards/c-1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));
    }
    assert_eq!(app.store.count(CARDS_COLLECTION).await, 0);
}

#[tokio::test]
async fn test_unsupported_method_on_card_is_405() {
    let app = TestApp::new();
    let (status, _) = app.send(get("/cards/c-1")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// Store Failures
// =============================================================================

#[tokio::test]
async fn test_store_failure_is_500_with_message() {
    let router = failing_store_router("Firestore is unavailable");

    let (status, body) = send(&router, get("/cards")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Firestore is unavailable"}));

    let (status, _) = send(
        &router,
        json_request(Method::POST, "/cards", &json!({"title": "t"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
