//! Document store abstraction.
//!
//! Records live in named collections and are addressed by a string id. Each
//! record is a schemaless JSON object. Two backends are provided:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          Resource handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │         DocumentStore trait             │
//! └────────────────────┬────────────────────┘
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │  MemoryStore    │    │  FirestoreStore     │
//! │ (in process)    │    │ (REST API)          │
//! └─────────────────┘    └─────────────────────┘
//! ```

mod firestore;
mod memory;
mod value;

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{Map, Value};

use crate::error::StoreError;

pub use firestore::{FirestoreStore, DEFAULT_FIRESTORE_DATABASE, DEFAULT_FIRESTORE_ENDPOINT};
pub use memory::MemoryStore;

/// Field mapping of a stored record.
pub type Fields = Map<String, Value>;

/// Length of generated document ids.
const DOCUMENT_ID_LEN: usize = 20;

/// A record read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Identity within its collection
    pub id: String,

    /// Stored fields (never includes the identity)
    pub fields: Fields,
}

/// How `set` treats the existing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the whole document; fields absent from the write disappear
    Replace,

    /// Merge the written fields into the existing document
    Merge,
}

/// Collection-scoped CRUD over a schemaless document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents in a collection, in store iteration order.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Documents whose top-level `field` equals `value`.
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError>;

    /// Insert a document under a store-assigned id and return that id.
    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Write a document at a known id, creating it if absent.
    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        mode: WriteMode,
    ) -> Result<(), StoreError>;

    /// Remove a document. Removing a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

/// Merge `patch` into `target`, descending into nested objects.
///
/// A non-empty object merges key by key into an object already stored at the
/// same key. Anything else, an empty object included, overwrites.
pub fn merge_fields(target: &mut Fields, patch: Fields) {
    for (key, value) in patch {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) if !nested.is_empty() => {
                merge_fields(existing, nested);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

/// Paths to every value a merge write touches.
///
/// Each path is a list of field names from the top level down. Non-empty
/// objects contribute the paths of their members; every other value (empty
/// objects included) contributes its own path.
pub fn merge_paths(fields: &Fields) -> Vec<Vec<String>> {
    let mut paths = Vec::new();
    collect_paths(fields, &mut Vec::new(), &mut paths);
    paths
}

fn collect_paths(fields: &Fields, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
    for (key, value) in fields {
        prefix.push(key.clone());
        match value {
            Value::Object(nested) if !nested.is_empty() => collect_paths(nested, prefix, out),
            _ => out.push(prefix.clone()),
        }
        prefix.pop();
    }
}

/// Generate a random 20 character alphanumeric document id.
pub fn generate_document_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(DOCUMENT_ID_LEN)
        .map(char::from)
        .collect()
}
