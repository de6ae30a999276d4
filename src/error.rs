//! Error types for the document store, media host, sessions and HTTP layer.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use thiserror::Error;

/// Errors returned by a document store backend.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backend answered with a non-success status
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// The backend answered with a body we could not interpret
    #[error("Malformed store response: {0}")]
    Decode(String),
}

/// Errors returned by a media host backend.
#[derive(Debug, Clone, Error)]
pub enum MediaError {
    /// The media host rejected the upload; carries its message verbatim
    #[error("{0}")]
    Upstream(String),

    /// Network or connection error
    #[error("{0}")]
    Connection(String),
}

/// Session validation failures.
///
/// The `Display` text is what clients see as the `reason` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Token is missing or unknown
    #[error("Invalid session")]
    Invalid,

    /// Token existed but has passed its expiry
    #[error("Session expired")]
    Expired,
}

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field is missing or the body is malformed (400)
    #[error("{0}")]
    InvalidInput(String),

    /// Admin secret missing or wrong (401)
    #[error("Unauthorized")]
    Unauthorized,

    /// Bad credentials (401)
    #[error("{0}")]
    Unauthenticated(String),

    /// Document store failure (500)
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Media host failure (500)
    #[error(transparent)]
    Media(#[from] MediaError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

/// A request that is not `multipart/form-data` carries no image.
impl From<MultipartRejection> for ApiError {
    fn from(_: MultipartRejection) -> Self {
        ApiError::InvalidInput("No image provided".to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::InvalidInput(err.body_text())
    }
}
