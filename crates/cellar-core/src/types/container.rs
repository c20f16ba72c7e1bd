//! Record type stored in the live namespace.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A keyed value with the instant it was captured.
///
/// This is also the element shape of the JSON wire format:
/// `{"key": "...", "storedAt": "2024-01-01T00:00:00.000Z", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataContainer<T> {
    /// Unique key within the live namespace.
    pub key: String,
    /// Capture timestamp (ISO 8601).
    pub stored_at: String,
    /// The wrapped value.
    pub data: T,
}

impl<T> DataContainer<T> {
    /// Create a new record.
    pub fn new(key: impl Into<String>, stored_at: impl Into<String>, data: T) -> Self {
        Self {
            key: key.into(),
            stored_at: stored_at.into(),
            data,
        }
    }
}

/// Check that a JSON value has the shape of a record.
///
/// Requires an object with a string `key`, a string `storedAt` and a
/// `data` member. `data` may be any JSON value, including `null`; only its
/// absence is rejected.
pub fn is_data_container(value: &Value) -> bool {
    record_shape_error(value).is_none()
}

/// Describe why a JSON value is not a record, or `None` if it is one.
pub fn record_shape_error(value: &Value) -> Option<&'static str> {
    let Some(obj) = value.as_object() else {
        return Some("element is not an object");
    };
    if !matches!(obj.get("key"), Some(Value::String(_))) {
        return Some("missing string field 'key'");
    }
    if !matches!(obj.get("storedAt"), Some(Value::String(_))) {
        return Some("missing string field 'storedAt'");
    }
    if !obj.contains_key("data") {
        return Some("missing field 'data'");
    }
    None
}
