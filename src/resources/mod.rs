//! Resource operations over the document store.
//!
//! Each submodule owns one collection and shapes its records: required-field
//! checks, defaults, server timestamps and the JSON returned to clients. The
//! HTTP layer only extracts request data and calls into these functions.
//!
//! | Module      | Collection   |
//! |-------------|--------------|
//! | [`cards`]   | `Questcards` |
//! | [`tags`]    | `QuestTags`  |
//! | [`queries`] | `Queries`    |
//! | [`users`]   | `Users`      |

pub mod cards;
pub mod queries;
pub mod tags;
pub mod users;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::store::{Document, Fields};

/// Current UTC time as ISO-8601 with a `Z` suffix.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Render a UTC time the way every stored timestamp is written.
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// JSON truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Read an `order` value, tolerating floats and anything else as 0.
pub fn order_of(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        _ => 0,
    }
}

/// A document's fields with its identity added under `id`.
///
/// The identity wins over any stored `id` field.
pub fn with_id(document: Document) -> Value {
    let Document { id, mut fields } = document;
    fields.insert("id".to_string(), Value::String(id));
    Value::Object(fields)
}

/// Take a string field out of a payload, treating `null` as absent.
pub(crate) fn take_string(fields: &mut Fields, key: &str) -> Result<Option<String>, String> {
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(format!("{} must be a string", key)),
    }
}
