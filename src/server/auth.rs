//! Authentication for the Questboard API.
//!
//! Two independent mechanisms live here:
//!
//! - **Admin secret**: `POST /users` requires an `X-ADMIN-SECRET` header equal
//!   to the configured secret. The check is the [`AdminGuard`] extractor.
//! - **Sessions**: `POST /login` checks a username and password and mints a
//!   session token; `POST /validate-session` resolves a token back to its
//!   username until it expires.
//!
//! # Security Properties
//!
//! - **Constant-time comparison**: the admin secret and stored passwords are
//!   compared with `subtle`
//! - **Required secret**: a missing header never matches; an empty secret is
//!   rejected at startup
//! - **Passive expiry**: expired tokens are removed when first presented

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{debug, info};

use crate::error::{ApiError, SessionError};
use crate::resources::users::{self, Credentials};

use super::handlers::{ApiJson, AppState};

/// Header carrying the admin secret.
pub const ADMIN_SECRET_HEADER: &str = "x-admin-secret";

// =============================================================================
// Admin Secret
// =============================================================================

/// The shared secret gating user creation.
#[derive(Clone)]
pub struct AdminSecret(Arc<str>);

impl AdminSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Arc::from(secret.into()))
    }

    /// Whether `candidate` equals the secret. `None` never matches.
    pub fn verify(&self, candidate: Option<&str>) -> bool {
        match candidate {
            Some(candidate) => bool::from(candidate.as_bytes().ct_eq(self.0.as_bytes())),
            None => false,
        }
    }
}

impl std::fmt::Debug for AdminSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminSecret([redacted])")
    }
}

/// Extractor that admits only requests carrying the admin secret.
///
/// Rejects with [`ApiError::Unauthorized`].
#[derive(Debug, Clone, Copy)]
pub struct AdminGuard;

impl<S> FromRequestParts<S> for AdminGuard
where
    AdminSecret: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let secret = AdminSecret::from_ref(state);
        let provided = parts
            .headers
            .get(ADMIN_SECRET_HEADER)
            .and_then(|value| value.to_str().ok());

        if secret.verify(provided) {
            Ok(AdminGuard)
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// Body of `POST /validate-session`.
#[derive(Debug, Default, Deserialize)]
pub struct ValidateSessionRequest {
    #[serde(default)]
    pub token: Option<String>,
}

/// Successful `POST /login` response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,

    /// ISO-8601 UTC expiry with a `Z` suffix
    pub expiry: String,
}

/// `POST /validate-session` response, for both outcomes.
#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub valid: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        debug!(reason = %self, "Session rejected");
        let body = SessionStatus {
            valid: false,
            username: None,
            reason: Some(self.to_string()),
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// `POST /login`
pub async fn login_handler(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<Json<LoginResponse>, ApiError> {
    let username = users::authenticate(state.store.as_ref(), credentials).await?;
    let issued = state.sessions.issue(username.as_str()).await;
    info!(username = %username, expiry = %issued.expiry, "Session issued");

    Ok(Json(LoginResponse {
        expiry: issued.expiry_rfc3339(),
        token: issued.token,
    }))
}

/// `POST /validate-session`
pub async fn validate_session_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ValidateSessionRequest>,
) -> Result<Json<SessionStatus>, SessionError> {
    let token = request
        .token
        .filter(|token| !token.is_empty())
        .ok_or(SessionError::Invalid)?;
    let username = state.sessions.validate(&token).await?;

    Ok(Json(SessionStatus {
        valid: true,
        username: Some(username),
        reason: None,
    }))
}

// =============================================================================
// Tests
// =============================================================================
