//! # Questboard
//!
//! A JSON API for quest cards, tags and saved queries, stored in a document
//! database, with image uploads to a media host and session-based login.
//!
//! ## Features
//!
//! - **Resource CRUD**: cards, tags, queries and users with light field
//!   shaping (defaults, server timestamps, sorting)
//! - **Pluggable storage**: Firestore over REST, or an in-memory store for
//!   development and tests
//! - **Image uploads**: signed Cloudinary uploads from multipart forms
//! - **Sessions**: in-memory tokens with a fixed lifetime
//! - **SPA hosting**: serves a bundled single-page app with an entry document
//!   fallback
//!
//! ## Architecture
//!
//! - [`store`] - Document store trait with memory and Firestore backends
//! - [`media`] - Media host trait with a Cloudinary backend
//! - [`session`] - Session token table
//! - [`resources`] - Per-collection operations
//! - [`server`] - Axum handlers, authentication and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use questboard::{create_router, AppState, MemoryStore, RouterConfig};
//! # use questboard::media::{CloudinaryCredentials, CloudinaryHost};
//!
//! #[tokio::main]
//! async fn main() {
//!     # let media = CloudinaryHost::new(
//!     #     reqwest::Client::new(),
//!     #     "https://api.cloudinary.com",
//!     #     CloudinaryCredentials {
//!     #         cloud_name: "demo".to_string(),
//!     #         api_key: "key".to_string(),
//!     #         api_secret: "secret".to_string(),
//!     #     },
//!     # );
//!     let state = AppState::new(Arc::new(MemoryStore::new()), Arc::new(media), "admin-secret");
//!     let router = create_router(state, RouterConfig::new("build"));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod media;
pub mod resources;
pub mod server;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{Config, StoreBackend};
pub use error::{ApiError, MediaError, SessionError, StoreError};
pub use media::{CloudinaryCredentials, CloudinaryHost, MediaHost, MediaUpload, UploadedMedia};
pub use server::{create_router, AppState, RouterConfig};
pub use session::{SessionStore, DEFAULT_SESSION_TTL_MINUTES};
pub use store::{Document, DocumentStore, Fields, FirestoreStore, MemoryStore, WriteMode};
