//! In-memory driver.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use cellar_core::error::{CellarError, CellarResult};
use cellar_core::traits::{DriverOpener, Namespace, StoreDriver};

/// Insertion-ordered map held in process memory.
///
/// Re-setting an existing key replaces its value in place.
#[derive(Default)]
pub struct MemoryDriver {
    entries: RwLock<Vec<(String, Value)>>,
}

impl MemoryDriver {
    /// Create an empty driver.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreDriver for MemoryDriver {
    async fn set_item(&self, key: &str, value: Value) -> CellarResult<Value> {
        let mut entries = self.entries.write().await;
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.clone(),
            None => entries.push((key.to_string(), value.clone())),
        }
        Ok(value)
    }

    async fn get_item(&self, key: &str) -> CellarResult<Option<Value>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()))
    }

    async fn get_items(&self) -> CellarResult<Vec<Value>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().map(|(_, v)| v.clone()).collect())
    }

    async fn remove_item(&self, key: &str) -> CellarResult<()> {
        self.entries.write().await.retain(|(k, _)| k != key);
        Ok(())
    }

    async fn clear(&self) -> CellarResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

/// Hands out one [`MemoryDriver`] per namespace.
///
/// Opening the same namespace twice returns the same driver, so two stores
/// built from one opener share state the way two handles on one database do.
#[derive(Default)]
pub struct MemoryOpener {
    drivers: Mutex<HashMap<Namespace, Arc<MemoryDriver>>>,
}

impl MemoryOpener {
    /// Create an opener with no namespaces.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DriverOpener for MemoryOpener {
    async fn open(&self, namespace: &Namespace) -> CellarResult<Arc<dyn StoreDriver>> {
        let mut drivers = self
            .drivers
            .lock()
            .map_err(|e| CellarError::driver(format!("Failed to acquire lock: {}", e)))?;
        let driver = drivers
            .entry(namespace.clone())
            .or_insert_with(|| {
                tracing::debug!("Creating memory namespace '{}'", namespace);
                Arc::new(MemoryDriver::new())
            })
            .clone();
        Ok(driver)
    }
}
