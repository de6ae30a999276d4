//! User accounts.
//!
//! Passwords are stored and compared as given. Username uniqueness is a
//! lookup followed by an insert, so two concurrent creations of the same
//! name can both succeed.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use crate::error::{ApiError, StoreError};
use crate::store::{DocumentStore, Fields};

/// Collection holding users.
pub const USERS_COLLECTION: &str = "Users";

const CREDENTIALS_REQUIRED: &str = "username and password required";
const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Username and password, as sent to `POST /users` and `POST /login`.
#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

impl Credentials {
    /// Both fields, or `InvalidInput` when either is missing or empty.
    pub fn require(self) -> Result<(String, String), ApiError> {
        match (self.username, self.password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Ok((username, password))
            }
            _ => Err(ApiError::InvalidInput(CREDENTIALS_REQUIRED.to_string())),
        }
    }
}

/// A user as returned to clients. The password never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
}

/// Every user without passwords.
pub async fn list_users(store: &dyn DocumentStore) -> Result<Vec<User>, StoreError> {
    let users: Vec<User> = store
        .list(USERS_COLLECTION)
        .await?
        .into_iter()
        .map(|doc| User {
            username: doc
                .fields
                .get("username")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            id: doc.id,
        })
        .collect();
    debug!(count = users.len(), "Listed users");
    Ok(users)
}

/// Create a user unless the username is taken.
pub async fn create_user(
    store: &dyn DocumentStore,
    credentials: Credentials,
) -> Result<User, ApiError> {
    let (username, password) = credentials.require()?;

    let existing = store
        .find_by_field(USERS_COLLECTION, "username", &json!(username))
        .await?;
    if !existing.is_empty() {
        return Err(ApiError::InvalidInput("Username already exists".to_string()));
    }

    let mut fields = Fields::new();
    fields.insert("username".to_string(), Value::String(username.clone()));
    fields.insert("password".to_string(), Value::String(password));
    let id = store.add(USERS_COLLECTION, fields).await?;
    info!(user_id = %id, username = %username, "User created");

    Ok(User { id, username })
}

/// Check a username and password against the stored user.
///
/// Returns the username on success. An unknown user and a wrong password
/// produce the same error.
pub async fn authenticate(
    store: &dyn DocumentStore,
    credentials: Credentials,
) -> Result<String, ApiError> {
    let (username, password) = credentials.require()?;

    let matches = store
        .find_by_field(USERS_COLLECTION, "username", &json!(username))
        .await?;
    let stored_password = matches
        .first()
        .and_then(|doc| doc.fields.get("password"))
        .and_then(Value::as_str);

    let valid = match stored_password {
        Some(stored) => bool::from(stored.as_bytes().ct_eq(password.as_bytes())),
        None => false,
    };

    if !valid {
        warn!(username = %username, "Login failed");
        return Err(ApiError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
    }

    Ok(username)
}
