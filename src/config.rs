//! Configuration management for Questboard.
//!
//! Settings come from command-line flags, each with an environment variable
//! fallback. `main` loads a `.env` file before parsing, so the same variables
//! can live there during development.
//!
//! # Environment Variables
//!
//! - `QB_HOST` - Server bind address (default: 0.0.0.0)
//! - `QB_PORT` - Server port (default: 5000)
//! - `ADMIN_SECRET` - Secret required by `POST /users` (required)
//! - `QB_STORE` - Document store backend, `firestore` or `memory` (default: firestore)
//! - `FIRESTORE_PROJECT_ID` - Firestore project (required for firestore)
//! - `FIRESTORE_DATABASE` - Firestore database (default: `(default)`)
//! - `FIRESTORE_ENDPOINT` - Firestore endpoint, e.g. an emulator
//! - `FIRESTORE_ACCESS_TOKEN` - OAuth bearer token for Firestore
//! - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET` - Media host account (required)
//! - `CLOUDINARY_ENDPOINT` - Media host endpoint
//! - `QB_STATIC_DIR` - SPA bundle directory (default: build)
//! - `QB_SESSION_TTL_MINUTES` - Session lifetime (default: 30)
//! - `QB_REQUEST_TIMEOUT_SECS` - Outbound request timeout (default: 30)
//! - `QB_MAX_UPLOAD_BYTES` - Request body limit (default: 10 MiB)
//! - `QB_CORS_ORIGINS` - Allowed CORS origins, comma-separated (default: any)

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::media::DEFAULT_CLOUDINARY_ENDPOINT;
use crate::server::DEFAULT_MAX_UPLOAD_BYTES;
use crate::session::{DEFAULT_SESSION_TTL_MINUTES, MAX_SESSION_TTL_MINUTES};
use crate::store::{DEFAULT_FIRESTORE_DATABASE, DEFAULT_FIRESTORE_ENDPOINT};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default SPA bundle directory.
pub const DEFAULT_STATIC_DIR: &str = "build";

/// Default outbound request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Which document store backs the API.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Firestore over its REST API
    Firestore,

    /// In-process store; data is lost on restart
    Memory,
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// Questboard - JSON API for quest cards, tags and saved queries.
#[derive(Parser, Debug, Clone)]
#[command(name = "questboard")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "QB_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "QB_PORT")]
    pub port: u16,

    /// Directory holding the single-page application bundle.
    #[arg(long, default_value = DEFAULT_STATIC_DIR, env = "QB_STATIC_DIR")]
    pub static_dir: PathBuf,

    /// Maximum request body size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES, env = "QB_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: usize,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// Secret that must accompany user creation in the X-ADMIN-SECRET header.
    #[arg(long, env = "ADMIN_SECRET", hide_env_values = true)]
    pub admin_secret: Option<String>,

    /// Session lifetime in minutes (at most one year).
    #[arg(long, default_value_t = DEFAULT_SESSION_TTL_MINUTES, env = "QB_SESSION_TTL_MINUTES")]
    pub session_ttl_minutes: i64,

    // =========================================================================
    // Document Store Configuration
    // =========================================================================
    /// Document store backend.
    #[arg(long, value_enum, default_value_t = StoreBackend::Firestore, env = "QB_STORE")]
    pub store: StoreBackend,

    /// Firestore project id.
    #[arg(long, env = "FIRESTORE_PROJECT_ID")]
    pub firestore_project: Option<String>,

    /// Firestore database name.
    #[arg(long, default_value = DEFAULT_FIRESTORE_DATABASE, env = "FIRESTORE_DATABASE")]
    pub firestore_database: String,

    /// Firestore endpoint. Point this at an emulator for local runs.
    #[arg(long, default_value = DEFAULT_FIRESTORE_ENDPOINT, env = "FIRESTORE_ENDPOINT")]
    pub firestore_endpoint: String,

    /// OAuth bearer token sent to Firestore. The emulator needs none.
    #[arg(long, env = "FIRESTORE_ACCESS_TOKEN", hide_env_values = true)]
    pub firestore_token: Option<String>,

    // =========================================================================
    // Media Host Configuration
    // =========================================================================
    /// Cloudinary cloud name.
    #[arg(long, env = "CLOUDINARY_CLOUD_NAME")]
    pub cloudinary_cloud_name: Option<String>,

    /// Cloudinary API key.
    #[arg(long, env = "CLOUDINARY_API_KEY")]
    pub cloudinary_api_key: Option<String>,

    /// Cloudinary API secret.
    #[arg(long, env = "CLOUDINARY_API_SECRET", hide_env_values = true)]
    pub cloudinary_api_secret: Option<String>,

    /// Cloudinary API endpoint.
    #[arg(long, default_value = DEFAULT_CLOUDINARY_ENDPOINT, env = "CLOUDINARY_ENDPOINT")]
    pub cloudinary_endpoint: String,

    /// Timeout for outbound store and media requests, in seconds.
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS, env = "QB_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: u64,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "QB_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if is_blank(&self.admin_secret) {
            return Err(
                "Admin secret is required. Set --admin-secret or ADMIN_SECRET".to_string(),
            );
        }

        if self.store == StoreBackend::Firestore && is_blank(&self.firestore_project) {
            return Err(
                "Firestore project is required. Set --firestore-project or FIRESTORE_PROJECT_ID, \
                 or use --store memory"
                    .to_string(),
            );
        }

        for (value, name) in [
            (&self.cloudinary_cloud_name, "CLOUDINARY_CLOUD_NAME"),
            (&self.cloudinary_api_key, "CLOUDINARY_API_KEY"),
            (&self.cloudinary_api_secret, "CLOUDINARY_API_SECRET"),
        ] {
            if is_blank(value) {
                return Err(format!("Cloudinary credentials are incomplete. Set {}", name));
            }
        }

        if self.session_ttl_minutes <= 0 {
            return Err("session_ttl_minutes must be greater than 0".to_string());
        }
        if self.session_ttl_minutes > MAX_SESSION_TTL_MINUTES {
            return Err(format!(
                "session_ttl_minutes must be at most {} (one year)",
                MAX_SESSION_TTL_MINUTES
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        if self.max_upload_bytes == 0 {
            return Err("max_upload_bytes must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The admin secret, or an empty string if unset (call validate() first).
    pub fn admin_secret_or_empty(&self) -> &str {
        self.admin_secret.as_deref().unwrap_or("")
    }
}

// =============================================================================
// Tests
// =============================================================================
