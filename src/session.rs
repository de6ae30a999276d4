//! In-memory login sessions.
//!
//! Sessions map an opaque token to the username that logged in and an expiry
//! time. The table lives only in process memory and is lost on restart.
//!
//! # Lifecycle
//!
//! ```text
//!   login ──► active ──(validate, now >= expiry)──► removed
//!                │
//!                └──(validate, now < expiry)──► active
//! ```
//!
//! Expiry is passive: entries are only checked (and dropped) when a request
//! validates them. Nothing sweeps the table in the background.

use std::collections::HashMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::SessionError;

/// Default session lifetime in minutes.
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 30;

/// Longest accepted session lifetime in minutes (one year).
pub const MAX_SESSION_TTL_MINUTES: i64 = 365 * 24 * 60;

/// Number of random bytes in a session token (256 bits).
const TOKEN_BYTES: usize = 32;

/// A live session entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub expiry: DateTime<Utc>,
}

/// A freshly minted session handed back to the client.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expiry: DateTime<Utc>,
}

impl IssuedSession {
    /// Expiry as ISO-8601 with an explicit `Z` suffix.
    pub fn expiry_rfc3339(&self) -> String {
        self.expiry.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

/// Process-wide token table.
///
/// Shared across handlers behind an `Arc`. Validation takes the write lock so
/// that the expiry check and the removal of an expired entry happen together.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    /// Create a store with the default 30 minute lifetime.
    pub fn new() -> Self {
        Self::with_ttl(Duration::minutes(DEFAULT_SESSION_TTL_MINUTES))
    }

    /// Create a store whose sessions live for `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Session lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a token for `username` and record it.
    pub async fn issue(&self, username: impl Into<String>) -> IssuedSession {
        self.issue_at(username, Utc::now()).await
    }

    /// Mint a token as if the current time were `now`.
    pub async fn issue_at(&self, username: impl Into<String>, now: DateTime<Utc>) -> IssuedSession {
        let token = generate_token();
        let expiry = now
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.sessions.write().await.insert(
            token.clone(),
            Session {
                username: username.into(),
                expiry,
            },
        );

        IssuedSession { token, expiry }
    }

    /// Check a token and return the username bound to it.
    pub async fn validate(&self, token: &str) -> Result<String, SessionError> {
        self.validate_at(token, Utc::now()).await
    }

    /// Check a token against an explicit clock reading.
    ///
    /// An expired entry is removed, so a second call reports
    /// [`SessionError::Invalid`] rather than [`SessionError::Expired`].
    pub async fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, SessionError> {
        let mut sessions = self.sessions.write().await;

        let expiry = match sessions.get(token) {
            Some(session) => session.expiry,
            None => return Err(SessionError::Invalid),
        };

        if now >= expiry {
            sessions.remove(token);
            debug!(expired_at = %expiry, "Dropped expired session");
            return Err(SessionError::Expired);
        }

        Ok(sessions[token].username.clone())
    }

    /// Look up a session without validating or removing it.
    pub async fn get(&self, token: &str) -> Option<Session> {
        self.sessions.read().await.get(token).cloned()
    }

    /// Number of entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the table holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// 256 random bits, URL-safe base64 without padding.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
