//! Quest tags: a display name plus a sort position.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{ApiError, StoreError};
use crate::store::{DocumentStore, Fields, WriteMode};

use super::order_of;

/// Collection holding tags.
pub const TAGS_COLLECTION: &str = "QuestTags";

/// Body of `POST /tags`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRequest {
    /// Existing tag to overwrite; a new tag is created when absent or empty
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub order: Option<Value>,
}

/// A tag as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub display_name: String,
    pub order: i64,
}

impl Tag {
    fn fields(&self) -> Fields {
        match json!({ "displayName": self.display_name, "order": self.order }) {
            Value::Object(map) => map,
            _ => Fields::new(),
        }
    }
}

/// Every tag in store order.
pub async fn list_tags(store: &dyn DocumentStore) -> Result<Vec<Tag>, StoreError> {
    let tags: Vec<Tag> = store
        .list(TAGS_COLLECTION)
        .await?
        .into_iter()
        .map(|doc| Tag {
            display_name: doc
                .fields
                .get("displayName")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            order: order_of(doc.fields.get("order")),
            id: doc.id,
        })
        .collect();
    debug!(count = tags.len(), "Listed tags");
    Ok(tags)
}

/// Create a tag, or overwrite the tag named by `id`.
pub async fn save_tag(store: &dyn DocumentStore, request: TagRequest) -> Result<Tag, ApiError> {
    let display_name = request
        .display_name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::InvalidInput("displayName is required".to_string()))?;
    let order = order_of(request.order.as_ref());

    let mut tag = Tag {
        id: String::new(),
        display_name,
        order,
    };

    match request.id.filter(|id| !id.is_empty()) {
        Some(id) => {
            store
                .set(TAGS_COLLECTION, &id, tag.fields(), WriteMode::Replace)
                .await?;
            tag.id = id;
            info!(tag_id = %tag.id, "Tag replaced");
        }
        None => {
            tag.id = store.add(TAGS_COLLECTION, tag.fields()).await?;
            info!(tag_id = %tag.id, "Tag created");
        }
    }

    Ok(tag)
}
