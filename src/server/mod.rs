//! HTTP server layer for Questboard.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │     /cards  /tags  /queries  /users  /login  /upload-image      │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────┐  ┌───────────┐  │
//! │  │  handlers   │  │    auth     │  │  assets  │  │  routes   │  │
//! │  │ (resources) │  │ (sessions)  │  │  (SPA)   │  │ (router)  │  │
//! │  └─────────────┘  └─────────────┘  └──────────┘  └───────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod assets;
pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::{
    login_handler, validate_session_handler, AdminGuard, AdminSecret, LoginResponse,
    SessionStatus, ValidateSessionRequest, ADMIN_SECRET_HEADER,
};
pub use handlers::{health_handler, ApiJson, AppState, ErrorResponse, HealthResponse};
pub use routes::{create_router, RouterConfig, DEFAULT_MAX_UPLOAD_BYTES};
