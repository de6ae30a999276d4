//! HTTP request handlers for the Questboard API.
//!
//! Handlers extract request data, call into [`crate::resources`] and shape
//! the JSON response. Every failure is an [`ApiError`], rendered as
//! `{"error": "<message>"}` with the matching status code.
//!
//! # Endpoints
//!
//! - `GET /cards`, `POST /cards`, `PUT /cards/{id}`, `DELETE /cards/{id}`
//! - `GET /tags`, `POST /tags`
//! - `GET /queries`, `POST /queries`, `PUT /queries/{id}`, `DELETE /queries/{id}`
//! - `GET /users`, `POST /users` (admin secret)
//! - `POST /upload-image`
//! - `GET /health`

use std::sync::Arc;

use axum::{
    extract::{
        multipart::MultipartRejection, FromRef, FromRequest, Multipart, Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::{ApiError, MediaError, StoreError};
use crate::media::{MediaHost, MediaUpload, UploadedMedia};
use crate::resources::cards::{self, SavedCard};
use crate::resources::queries::{self, Query, QueryRequest};
use crate::resources::tags::{self, Tag, TagRequest};
use crate::resources::users::{self, Credentials, User};
use crate::session::SessionStore;
use crate::store::{DocumentStore, Fields};

use super::auth::{AdminGuard, AdminSecret};

/// Multipart field carrying the uploaded image.
const IMAGE_FIELD: &str = "image";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// Cloned into every handler through Axum's `State` extractor; all members
/// are reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Backing document database
    pub store: Arc<dyn DocumentStore>,

    /// Image host for uploads
    pub media: Arc<dyn MediaHost>,

    /// Live login sessions
    pub sessions: Arc<SessionStore>,

    /// Secret required to create users
    pub admin: AdminSecret,
}

impl AppState {
    /// Create state with a fresh session table using the default lifetime.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        media: Arc<dyn MediaHost>,
        admin_secret: impl Into<String>,
    ) -> Self {
        Self {
            store,
            media,
            sessions: Arc::new(SessionStore::new()),
            admin: AdminSecret::new(admin_secret),
        }
    }

    /// Replace the session table.
    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = Arc::new(sessions);
        self
    }
}

impl FromRef<AppState> for AdminSecret {
    fn from_ref(state: &AppState) -> Self {
        state.admin.clone()
    }
}

// =============================================================================
// Request Extraction
// =============================================================================

/// JSON body extractor whose rejections render as [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

// =============================================================================
// Response Types
// =============================================================================

/// JSON error body returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// Body returned by card writes.
#[derive(Debug, Serialize)]
pub struct CardIdResponse {
    pub id: String,
}

/// Body returned by updates and deletes.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,

    /// Server timestamp written by a query update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl SuccessResponse {
    fn ok() -> Json<Self> {
        Json(Self {
            success: true,
            timestamp: None,
        })
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert ApiError to HTTP response.
///
/// 5xx errors are logged at ERROR level, bad credentials at WARN and other
/// client errors at DEBUG.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            ApiError::Store(StoreError::Connection(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "store_unreachable")
            }
            ApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
            ApiError::Media(MediaError::Connection(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "media_unreachable")
            }
            ApiError::Media(_) => (StatusCode::INTERNAL_SERVER_ERROR, "media_error"),
        };
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::UNAUTHORIZED {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Rejected: {}",
                message
            );
        } else {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// =============================================================================
// Cards
// =============================================================================

/// `GET /cards`
pub async fn list_cards_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<serde_json::Value>>, ApiError> {
    Ok(Json(cards::list_cards(state.store.as_ref()).await?))
}

/// `POST /cards`
///
/// Returns 201 for a new card and 200 when an `id` in the body replaced an
/// existing one.
pub async fn create_card_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Fields>,
) -> Result<(StatusCode, Json<CardIdResponse>), ApiError> {
    let saved = cards::save_card(state.store.as_ref(), payload).await?;
    let status = match saved {
        SavedCard::Created(_) => StatusCode::CREATED,
        SavedCard::Replaced(_) => StatusCode::OK,
    };
    Ok((
        status,
        Json(CardIdResponse {
            id: saved.id().to_string(),
        }),
    ))
}

/// `PUT /cards/{id}`
pub async fn update_card_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<Fields>,
) -> Result<Json<SuccessResponse>, ApiError> {
    cards::update_card(state.store.as_ref(), &id, payload).await?;
    Ok(SuccessResponse::ok())
}

/// `DELETE /cards/{id}`
pub async fn delete_card_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    cards::delete_card(state.store.as_ref(), &id).await?;
    Ok(SuccessResponse::ok())
}

// =============================================================================
// Tags
// =============================================================================

/// `GET /tags`
pub async fn list_tags_handler(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(tags::list_tags(state.store.as_ref()).await?))
}

/// `POST /tags`
pub async fn save_tag_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TagRequest>,
) -> Result<Json<Tag>, ApiError> {
    Ok(Json(tags::save_tag(state.store.as_ref(), request).await?))
}

// =============================================================================
// Queries
// =============================================================================

/// `GET /queries`
pub async fn list_queries_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Query>>, ApiError> {
    Ok(Json(queries::list_queries(state.store.as_ref()).await?))
}

/// `POST /queries`
pub async fn create_query_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<QueryRequest>,
) -> Result<Json<Query>, ApiError> {
    Ok(Json(queries::create_query(state.store.as_ref(), request).await?))
}

/// `PUT /queries/{id}`
pub async fn update_query_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<Fields>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let timestamp = queries::update_query(state.store.as_ref(), &id, payload).await?;
    Ok(Json(SuccessResponse {
        success: true,
        timestamp: Some(timestamp),
    }))
}

/// `DELETE /queries/{id}`
pub async fn delete_query_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    queries::delete_query(state.store.as_ref(), &id).await?;
    Ok(SuccessResponse::ok())
}

// =============================================================================
// Users
// =============================================================================

/// `GET /users`
pub async fn list_users_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(users::list_users(state.store.as_ref()).await?))
}

/// `POST /users`
///
/// The admin guard runs before the body is read, so a request without the
/// right `X-ADMIN-SECRET` is refused with 401 whatever its body.
pub async fn create_user_handler(
    _admin: AdminGuard,
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(users::create_user(state.store.as_ref(), credentials).await?))
}

// =============================================================================
// Uploads
// =============================================================================

/// `POST /upload-image`
///
/// Takes the first multipart part named `image` that carries a filename and
/// forwards it to the media host.
pub async fn upload_image_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadedMedia>, ApiError> {
    let mut multipart = multipart?;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        // A part without a filename is a plain form value, not a file
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;

        upload = Some(MediaUpload {
            file_name,
            content_type,
            data,
        });
        break;
    }

    let upload = upload.ok_or_else(|| ApiError::InvalidInput("No image provided".to_string()))?;
    if upload.file_name.is_empty() {
        return Err(ApiError::InvalidInput("No selected file".to_string()));
    }

    Ok(Json(state.media.upload(upload).await?))
}

// =============================================================================
// Health
// =============================================================================

/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
