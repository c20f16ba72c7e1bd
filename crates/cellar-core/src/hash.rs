//! Content hashing used for snapshot keys and default record keys.

use serde::Serialize;

/// Lowercase hex MD5 digest of `text`.
pub fn md5_hex(text: &str) -> String {
    format!("{:x}", md5::compute(text.as_bytes()))
}

/// Default record key: the content hash of the value's compact JSON.
pub fn content_key<T: Serialize>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => md5_hex(&json),
        // Values that cannot be serialized cannot be stored either; the
        // write will fail later with the real serialization error.
        Err(_) => md5_hex(""),
    }
}
