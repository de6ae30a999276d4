//! Quest cards.
//!
//! Cards are free-form field mappings. The server owns two keys: `category`
//! is defaulted whenever it is falsy, and `lastModified` is refreshed on every
//! write.

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ApiError, StoreError};
use crate::store::{DocumentStore, Fields, WriteMode};

use super::{now_timestamp, is_truthy, take_string, with_id};

/// Collection holding cards.
pub const CARDS_COLLECTION: &str = "Questcards";

/// Category written when a payload has none.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Outcome of [`save_card`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SavedCard {
    /// A new document was inserted under a store-assigned id
    Created(String),

    /// The document at a client-supplied id was replaced
    Replaced(String),
}

impl SavedCard {
    pub fn id(&self) -> &str {
        match self {
            SavedCard::Created(id) | SavedCard::Replaced(id) => id,
        }
    }
}

/// Stamp `lastModified` and default `category`.
fn prepare(fields: &mut Fields, timestamp: String) {
    fields.insert("lastModified".to_string(), Value::String(timestamp));
    if !fields.get("category").is_some_and(is_truthy) {
        fields.insert(
            "category".to_string(),
            Value::String(DEFAULT_CATEGORY.to_string()),
        );
    }
}

/// Every card, each with its `id`.
pub async fn list_cards(store: &dyn DocumentStore) -> Result<Vec<Value>, StoreError> {
    let cards: Vec<Value> = store
        .list(CARDS_COLLECTION)
        .await?
        .into_iter()
        .map(with_id)
        .collect();
    debug!(count = cards.len(), "Listed cards");
    Ok(cards)
}

/// Create a card, or replace the whole card when the payload names an `id`.
pub async fn save_card(
    store: &dyn DocumentStore,
    mut payload: Fields,
) -> Result<SavedCard, ApiError> {
    let id = take_string(&mut payload, "id")
        .map_err(ApiError::InvalidInput)?
        .filter(|id| !id.is_empty());
    prepare(&mut payload, now_timestamp());

    match id {
        Some(id) => {
            store
                .set(CARDS_COLLECTION, &id, payload, WriteMode::Replace)
                .await?;
            info!(card_id = %id, "Card replaced");
            Ok(SavedCard::Replaced(id))
        }
        None => {
            let id = store.add(CARDS_COLLECTION, payload).await?;
            info!(card_id = %id, "Card created");
            Ok(SavedCard::Created(id))
        }
    }
}

/// Merge a partial card into the stored one.
pub async fn update_card(
    store: &dyn DocumentStore,
    id: &str,
    mut payload: Fields,
) -> Result<(), StoreError> {
    payload.remove("id");
    prepare(&mut payload, now_timestamp());
    store
        .set(CARDS_COLLECTION, id, payload, WriteMode::Merge)
        .await?;
    info!(card_id = %id, "Card updated");
    Ok(())
}

/// Remove a card. Missing cards are not an error.
pub async fn delete_card(store: &dyn DocumentStore, id: &str) -> Result<(), StoreError> {
    store.delete(CARDS_COLLECTION, id).await?;
    info!(card_id = %id, "Card deleted");
    Ok(())
}
