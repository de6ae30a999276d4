//! Router configuration for the Questboard API.
//!
//! # Route Structure
//!
//! ```text
//! /health                    - Health check
//! /cards, /cards/{id}        - Quest cards
//! /tags                      - Quest tags
//! /queries, /queries/{id}    - Saved queries
//! /users                     - Users (POST requires X-ADMIN-SECRET)
//! /login, /validate-session  - Sessions
//! /upload-image              - Image upload
//! /*                         - SPA bundle with index.html fallback
//! ```
//!
//! # Example
//!
//! ```ignore
//! use questboard::server::{create_router, AppState, RouterConfig};
//!
//! let state = AppState::new(store, media, "admin-secret");
//! let config = RouterConfig::new("build")
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(state, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::path::PathBuf;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use http::header::CONTENT_TYPE;
use http::{HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::assets::spa_service;
use super::auth::{login_handler, validate_session_handler, ADMIN_SECRET_HEADER};
use super::handlers::{
    create_card_handler, create_query_handler, create_user_handler, delete_card_handler,
    delete_query_handler, health_handler, list_cards_handler, list_queries_handler,
    list_tags_handler, list_users_handler, save_tag_handler, update_card_handler,
    update_query_handler, upload_image_handler, AppState,
};

/// Default request body limit (10 MiB), sized for image uploads.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Directory holding the SPA bundle
    pub static_dir: PathBuf,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Maximum request body size in bytes
    pub max_upload_bytes: usize,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a configuration serving the bundle in `static_dir`.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Request bodies are limited to 10 MiB
    /// - Tracing is enabled
    pub fn new(static_dir: impl Into<PathBuf>) -> Self {
        Self {
            static_dir: static_dir.into(),
            cors_origins: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Set the request body limit.
    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
pub fn create_router(state: AppState, config: RouterConfig) -> Router {
    let api = Router::new()
        .route("/health", get(health_handler))
        .route("/cards", get(list_cards_handler).post(create_card_handler))
        .route(
            "/cards/{id}",
            put(update_card_handler).delete(delete_card_handler),
        )
        .route("/tags", get(list_tags_handler).post(save_tag_handler))
        .route(
            "/queries",
            get(list_queries_handler).post(create_query_handler),
        )
        .route(
            "/queries/{id}",
            put(update_query_handler).delete(delete_query_handler),
        )
        .route("/users", get(list_users_handler).post(create_user_handler))
        .route("/login", post(login_handler))
        .route("/validate-session", post(validate_session_handler))
        .route("/upload-image", post(upload_image_handler))
        .with_state(state);

    let router = api
        .fallback_service(spa_service(&config.static_dir))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(build_cors_layer(&config));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any).allow_headers(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
                .allow_headers([CONTENT_TYPE, HeaderName::from_static(ADMIN_SECRET_HEADER)])
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
