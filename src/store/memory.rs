//! In-process document store.
//!
//! Used for local development and tests. Collections iterate in id order,
//! which is also the order Firestore lists documents in.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::StoreError;

use super::{generate_document_id, merge_fields, Document, DocumentStore, Fields, WriteMode};

type Collection = BTreeMap<String, Fields>;

/// Document store held entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a single document. Not part of [`DocumentStore`]; handy in tests.
    pub async fn get(&self, collection: &str, id: &str) -> Option<Fields> {
        self.collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, |docs| docs.len())
    }
}

fn to_document((id, fields): (&String, &Fields)) -> Document {
    Document {
        id: id.clone(),
        fields: fields.clone(),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().map(to_document).collect())
            .unwrap_or_default())
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, fields)| fields.get(field) == Some(value))
                    .map(to_document)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        let mut id = generate_document_id();
        while docs.contains_key(&id) {
            id = generate_document_id();
        }

        docs.insert(id.clone(), fields);
        Ok(id)
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        match mode {
            WriteMode::Replace => {
                docs.insert(id.to_string(), fields);
            }
            WriteMode::Merge => {
                merge_fields(docs.entry(id.to_string()).or_default(), fields);
            }
        }

        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        if let Some(docs) = self.collections.write().await.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }
}
