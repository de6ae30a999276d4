//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! Firestore's REST API wraps every value in a single-key object naming its
//! type, e.g. `{"stringValue": "x"}` or `{"integerValue": "42"}` (64-bit
//! integers travel as strings).

use serde_json::{json, Map, Number, Value};

use crate::error::StoreError;

use super::Fields;

/// Encode a field mapping as a Firestore `fields` object.
pub fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(key, value)| (key.clone(), encode_value(value)))
            .collect(),
    )
}

/// Encode one JSON value.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or(0.0) }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({
            "mapValue": { "fields": encode_fields(map) }
        }),
    }
}

/// Decode a Firestore `fields` object. An absent object decodes as empty.
pub fn decode_fields(fields: Option<&Value>) -> Result<Fields, StoreError> {
    match fields {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(key, value)| Ok::<_, StoreError>((key.clone(), decode_value(value)?)))
            .collect(),
        Some(other) => Err(StoreError::Decode(format!(
            "expected a fields object, got {}",
            other
        ))),
    }
}

/// Decode one typed value.
pub fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let map = value
        .as_object()
        .ok_or_else(|| StoreError::Decode(format!("expected a typed value, got {}", value)))?;

    let (kind, inner) = map
        .iter()
        .next()
        .ok_or_else(|| StoreError::Decode("empty typed value".to_string()))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => Ok(Value::Bool(inner.as_bool().unwrap_or(false))),
        "integerValue" => decode_integer(inner),
        "doubleValue" => Ok(decode_double(inner)),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => {
            Ok(inner.clone())
        }
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => inner
            .get("values")
            .and_then(Value::as_array)
            .map(|values| values.iter().map(decode_value).collect::<Result<Vec<_>, _>>())
            .unwrap_or_else(|| Ok(Vec::new()))
            .map(Value::Array),
        "mapValue" => decode_fields(inner.get("fields")).map(Value::Object),
        other => Err(StoreError::Decode(format!("unknown value type: {}", other))),
    }
}

fn decode_integer(inner: &Value) -> Result<Value, StoreError> {
    let parsed = match inner {
        Value::String(s) => s.parse::<i64>().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    };
    parsed
        .map(|i| Value::Number(i.into()))
        .ok_or_else(|| StoreError::Decode(format!("invalid integerValue: {}", inner)))
}

/// Doubles may arrive as numbers or as the strings "NaN"/"Infinity", which
/// have no JSON representation and decode as null.
fn decode_double(inner: &Value) -> Value {
    inner
        .as_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
