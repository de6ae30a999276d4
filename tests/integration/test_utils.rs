//! Test utilities for integration tests.
//!
//! This module provides mock collaborators (media host, failing store) and
//! helpers for driving the router with JSON and multipart requests.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::RwLock;
use tower::ServiceExt;

use questboard::error::{MediaError, StoreError};
use questboard::media::{MediaHost, MediaUpload, UploadedMedia};
use questboard::server::{create_router, AppState, RouterConfig};
use questboard::session::SessionStore;
use questboard::store::{Document, DocumentStore, Fields, MemoryStore, WriteMode};

/// Admin secret used by every test app.
pub const ADMIN_SECRET: &str = "test-admin-secret";

// =============================================================================
// Mock Media Host
// =============================================================================

/// A media host that records uploads and answers with a canned result.
#[derive(Default)]
pub struct MockMediaHost {
    failure: Option<String>,
    uploads: RwLock<Vec<MediaUpload>>,
}

impl MockMediaHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host that rejects every upload with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            uploads: RwLock::new(Vec::new()),
        }
    }

    pub async fn uploads(&self) -> Vec<MediaUpload> {
        self.uploads.read().await.clone()
    }
}

#[async_trait]
impl MediaHost for MockMediaHost {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadedMedia, MediaError> {
        let public_id = format!("uploads/{}", upload.file_name);
        self.uploads.write().await.push(upload);

        match &self.failure {
            Some(message) => Err(MediaError::Upstream(message.clone())),
            None => Ok(UploadedMedia {
                url: format!("https://media.example/{}", public_id),
                public_id,
            }),
        }
    }
}

// =============================================================================
// Failing Store
// =============================================================================

/// A document store whose every call fails with a backend error.
pub struct FailingStore {
    pub message: String,
}

impl FailingStore {
    fn error(&self) -> StoreError {
        StoreError::Backend {
            status: 503,
            message: self.message.clone(),
        }
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn list(&self, _collection: &str) -> Result<Vec<Document>, StoreError> {
        Err(self.error())
    }

    async fn find_by_field(
        &self,
        _collection: &str,
        _field: &str,
        _value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        Err(self.error())
    }

    async fn add(&self, _collection: &str, _fields: Fields) -> Result<String, StoreError> {
        Err(self.error())
    }

    async fn set(
        &self,
        _collection: &str,
        _id: &str,
        _fields: Fields,
        _mode: WriteMode,
    ) -> Result<(), StoreError> {
        Err(self.error())
    }

    async fn delete(&self, _collection: &str, _id: &str) -> Result<(), StoreError> {
        Err(self.error())
    }
}

// =============================================================================
// Test Application
// =============================================================================

/// A router wired to an in-memory store and a mock media host.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub media: Arc<MockMediaHost>,
}

/// Builder for [`TestApp`].
pub struct TestAppBuilder {
    media: MockMediaHost,
    sessions: SessionStore,
    static_dir: PathBuf,
    max_upload_bytes: Option<usize>,
    cors_origins: Option<Vec<String>>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            media: MockMediaHost::new(),
            sessions: SessionStore::new(),
            static_dir: PathBuf::from("does-not-exist"),
            max_upload_bytes: None,
            cors_origins: None,
        }
    }

    /// Send a request and return the status and the body parsed as JSON.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        send(&self.router, request).await
    }
}

impl TestAppBuilder {
    pub fn media(mut self, media: MockMediaHost) -> Self {
        self.media = media;
        self
    }

    pub fn sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = Some(bytes);
        self
    }

    pub fn cors_origins(mut self, origins: &[&str]) -> Self {
        self.cors_origins = Some(origins.iter().map(|o| o.to_string()).collect());
        self
    }

    pub fn build(self) -> TestApp {
        let store = Arc::new(MemoryStore::new());
        let media = Arc::new(self.media);

        let state = AppState::new(store.clone(), media.clone(), ADMIN_SECRET)
            .with_sessions(self.sessions);

        let mut config = RouterConfig::new(self.static_dir).with_tracing(false);
        if let Some(bytes) = self.max_upload_bytes {
            config = config.with_max_upload_bytes(bytes);
        }
        if let Some(origins) = self.cors_origins {
            config = config.with_cors_origins(origins);
        }

        TestApp {
            router: create_router(state.clone(), config),
            state,
            store,
            media,
        }
    }
}

/// A router whose store fails every call with `message`.
pub fn failing_store_router(message: &str) -> Router {
    let state = AppState::new(
        Arc::new(FailingStore {
            message: message.to_string(),
        }),
        Arc::new(MockMediaHost::new()),
        ADMIN_SECRET,
    );
    create_router(state, RouterConfig::new("does-not-exist").with_tracing(false))
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Send a request through `router` and parse the response body as JSON.
///
/// An empty or non-JSON body comes back as `Value::Null`.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// Build a body-less request.
pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Build a `GET` request.
pub fn get(uri: &str) -> Request<Body> {
    empty_request(Method::GET, uri)
}

/// Build a request with a JSON body.
pub fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a request with a raw body and content type.
pub fn raw_request(method: Method, uri: &str, content_type: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body.to_string()))
        .unwrap()
}

// =============================================================================
// Multipart Bodies
// =============================================================================

/// Boundary used by [`multipart_request`].
pub const BOUNDARY: &str = "questboard-test-boundary";

/// One part of a multipart form.
pub struct FormPart<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

impl<'a> FormPart<'a> {
    pub fn file(name: &'a str, file_name: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            file_name: Some(file_name),
            content_type: Some("image/png"),
            data,
        }
    }

    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            file_name: None,
            content_type: None,
            data: value.as_bytes(),
        }
    }
}

/// Build a `multipart/form-data` POST to `uri`.
pub fn multipart_request(uri: &str, parts: &[FormPart<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(file_name) = part.file_name {
            disposition.push_str(&format!("; filename=\"{}\"", file_name));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}
