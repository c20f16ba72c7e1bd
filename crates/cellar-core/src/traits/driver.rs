//! Storage driver trait and related types.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CellarResult;

/// Identifies one storage namespace: a database `name` and a `store_name`
/// within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    /// Database name.
    pub name: String,
    /// Store name within the database.
    pub store_name: String,
}

impl Namespace {
    /// Create a new namespace.
    pub fn new(name: impl Into<String>, store_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store_name: store_name.into(),
        }
    }

    /// The sibling namespace that holds this namespace's snapshots.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self {
            name: self.name.clone(),
            store_name: format!("{}{}", self.store_name, suffix),
        }
    }

    /// Identifier for naming backend storage (files, table rows).
    ///
    /// `name` and `store_name` are joined with `_` after escaping `%` and
    /// `_` inside each part, so distinct namespaces never share an id.
    /// Names without those characters keep the plain `name_storeName` form.
    pub fn storage_id(&self) -> String {
        format!("{}_{}", escape_part(&self.name), escape_part(&self.store_name))
    }
}

fn escape_part(part: &str) -> String {
    part.replace('%', "%25").replace('_', "%5F")
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.name, self.store_name)
    }
}

/// Core StoreDriver trait - all storage backends implement this.
///
/// A driver is a flat async key-value map over JSON values. Ordering of
/// `get_items` is whatever the backend provides.
#[async_trait]
pub trait StoreDriver: Send + Sync {
    /// Store `value` under `key`, replacing any previous value. Returns the stored value.
    async fn set_item(&self, key: &str, value: Value) -> CellarResult<Value>;

    /// Get the value stored under `key`.
    async fn get_item(&self, key: &str) -> CellarResult<Option<Value>>;

    /// Get every stored value.
    async fn get_items(&self) -> CellarResult<Vec<Value>>;

    /// Delete the value under `key`. Missing keys are not an error.
    async fn remove_item(&self, key: &str) -> CellarResult<()>;

    /// Delete every value in the namespace.
    async fn clear(&self) -> CellarResult<()>;
}

/// Opens drivers for namespaces. A versioned store opens two: one for live
/// records and one for snapshots.
#[async_trait]
pub trait DriverOpener: Send + Sync {
    /// Open (or create) the driver for `namespace`.
    async fn open(&self, namespace: &Namespace) -> CellarResult<Arc<dyn StoreDriver>>;
}
