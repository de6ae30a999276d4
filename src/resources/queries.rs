//! Saved queries.
//!
//! Records written by older clients may lack any field, so reads fill in
//! defaults. Note the status default differs: a stored record without a
//! status reads as `"published"`, while a new query without one is created
//! as `"draft"`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{ApiError, StoreError};
use crate::store::{Document, DocumentStore, Fields, WriteMode};

use super::{now_timestamp, order_of};

/// Collection holding queries.
pub const QUERIES_COLLECTION: &str = "Queries";

const DEFAULT_TYPE: &str = "query";
const READ_STATUS: &str = "published";
const CREATE_STATUS: &str = "draft";

/// Body of `POST /queries`.
#[derive(Debug, Default, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,

    #[serde(default)]
    pub tags: Option<Vec<String>>,

    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    #[serde(default)]
    pub icon: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub order: Option<Value>,
}

/// A query as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub id: String,
    pub query: String,
    pub tags: Vec<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub icon: Option<String>,
    pub status: String,
    pub order: i64,
    pub timestamp: Option<String>,
}

impl Query {
    fn from_document(doc: Document) -> Self {
        let Document { id, fields } = doc;
        let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);

        Self {
            query: text("query").unwrap_or_default(),
            tags: fields
                .get("tags")
                .and_then(Value::as_array)
                .map(|tags| {
                    tags.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            kind: text("type").unwrap_or_else(|| DEFAULT_TYPE.to_string()),
            icon: text("icon"),
            status: text("status").unwrap_or_else(|| READ_STATUS.to_string()),
            order: order_of(fields.get("order")),
            timestamp: text("timestamp"),
            id,
        }
    }

    fn fields(&self) -> Fields {
        match json!({
            "query": self.query,
            "tags": self.tags,
            "type": self.kind,
            "icon": self.icon,
            "status": self.status,
            "order": self.order,
            "timestamp": self.timestamp,
        }) {
            Value::Object(map) => map,
            _ => Fields::new(),
        }
    }
}

/// Every query, ascending by `order`. Ties keep store order.
pub async fn list_queries(store: &dyn DocumentStore) -> Result<Vec<Query>, StoreError> {
    let mut queries: Vec<Query> = store
        .list(QUERIES_COLLECTION)
        .await?
        .into_iter()
        .map(Query::from_document)
        .collect();
    queries.sort_by_key(|q| q.order);
    debug!(count = queries.len(), "Listed queries");
    Ok(queries)
}

/// Create a query and return it as stored.
pub async fn create_query(
    store: &dyn DocumentStore,
    request: QueryRequest,
) -> Result<Query, ApiError> {
    let text = request
        .query
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::InvalidInput("Query is required".to_string()))?;

    let mut query = Query {
        id: String::new(),
        query: text,
        tags: request.tags.unwrap_or_default(),
        kind: request.kind.unwrap_or_else(|| DEFAULT_TYPE.to_string()),
        icon: request.icon,
        status: request.status.unwrap_or_else(|| CREATE_STATUS.to_string()),
        order: order_of(request.order.as_ref()),
        timestamp: Some(now_timestamp()),
    };

    query.id = store.add(QUERIES_COLLECTION, query.fields()).await?;
    info!(query_id = %query.id, "Query created");
    Ok(query)
}

/// Merge a partial query into the stored one. Returns the new timestamp.
pub async fn update_query(
    store: &dyn DocumentStore,
    id: &str,
    mut payload: Fields,
) -> Result<String, StoreError> {
    let timestamp = now_timestamp();
    payload.remove("id");
    payload.insert("timestamp".to_string(), Value::String(timestamp.clone()));

    store
        .set(QUERIES_COLLECTION, id, payload, WriteMode::Merge)
        .await?;
    info!(query_id = %id, "Query updated");
    Ok(timestamp)
}

/// Remove a query. Missing queries are not an error.
pub async fn delete_query(store: &dyn DocumentStore, id: &str) -> Result<(), StoreError> {
    store.delete(QUERIES_COLLECTION, id).await?;
    info!(query_id = %id, "Query deleted");
    Ok(())
}
