//! JSON file driver.
//!
//! Each namespace lives in `<dir>/<storage id>.json` (`name_storeName`,
//! with `_` and `%` inside the parts escaped) as an array of
//! `{"key": ..., "value": ...}` entries in insertion order. The whole file
//! is rewritten on every mutation, through a temporary file and a rename.
//! A mutation becomes visible only after the file is written.
//!
//! On case-insensitive filesystems, namespaces that differ only in case
//! share a file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use cellar_core::error::{CellarError, CellarResult};
use cellar_core::traits::{DriverOpener, Namespace, StoreDriver};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileEntry {
    key: String,
    value: Value,
}

/// Driver backed by one JSON file.
pub struct FileDriver {
    path: PathBuf,
    entries: Mutex<Vec<FileEntry>>,
}

impl FileDriver {
    /// Open (or create on first write) the file for `namespace` under `dir`.
    pub async fn open(dir: impl AsRef<Path>, namespace: &Namespace) -> CellarResult<Self> {
        let path = dir.as_ref().join(format!("{}.json", namespace.storage_id()));
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(text) if text.trim().is_empty() => Vec::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                CellarError::driver_with_source(
                    format!("Failed to parse store file {}", path.display()),
                    e,
                )
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!("Opened {} ({} entries)", path.display(), entries.len());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &[FileEntry]) -> CellarResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let text = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, text).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl StoreDriver for FileDriver {
    async fn set_item(&self, key: &str, value: Value) -> CellarResult<Value> {
        let mut entries = self.entries.lock().await;
        let mut staged = entries.clone();
        match staged.iter_mut().find(|e| e.key == key) {
            Some(entry) => entry.value = value.clone(),
            None => staged.push(FileEntry {
                key: key.to_string(),
                value: value.clone(),
            }),
        }
        self.persist(&staged).await?;
        *entries = staged;
        tracing::debug!("Wrote '{}' to {}", key, self.path.display());
        Ok(value)
    }

    async fn get_item(&self, key: &str) -> CellarResult<Option<Value>> {
        let entries = self.entries.lock().await;
        Ok(entries.iter().find(|e| e.key == key).map(|e| e.value.clone()))
    }

    async fn get_items(&self) -> CellarResult<Vec<Value>> {
        let entries = self.entries.lock().await;
        Ok(entries.iter().map(|e| e.value.clone()).collect())
    }

    async fn remove_item(&self, key: &str) -> CellarResult<()> {
        let mut entries = self.entries.lock().await;
        if !entries.iter().any(|e| e.key == key) {
            return Ok(());
        }
        let staged: Vec<FileEntry> = entries.iter().filter(|e| e.key != key).cloned().collect();
        self.persist(&staged).await?;
        *entries = staged;
        Ok(())
    }

    async fn clear(&self) -> CellarResult<()> {
        let mut entries = self.entries.lock().await;
        self.persist(&[]).await?;
        entries.clear();
        Ok(())
    }
}

/// Opens [`FileDriver`]s under one directory.
///
/// Drivers are cached per namespace so every handle in the process sees
/// the same entries.
pub struct FileOpener {
    dir: PathBuf,
    drivers: Mutex<HashMap<Namespace, Arc<FileDriver>>>,
}

impl FileOpener {
    /// Create an opener rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            drivers: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl DriverOpener for FileOpener {
    async fn open(&self, namespace: &Namespace) -> CellarResult<Arc<dyn StoreDriver>> {
        let mut drivers = self.drivers.lock().await;
        if let Some(driver) = drivers.get(namespace) {
            return Ok(driver.clone());
        }
        let driver = Arc::new(FileDriver::open(&self.dir, namespace).await?);
        drivers.insert(namespace.clone(), driver.clone());
        Ok(driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let ns = Namespace::new("hoge", "foo");

        let driver = FileDriver::open(dir.path(), &ns).await.unwrap();
        driver.set_item("b", json!({"n": 1})).await.unwrap();
        driver.set_item("a", json!({"n": 2})).await.unwrap();
        driver.set_item("b", json!({"n": 3})).await.unwrap();
        assert_eq!(driver.path(), dir.path().join("hoge_foo.json"));

        let reopened = FileDriver::open(dir.path(), &ns).await.unwrap();
        assert_eq!(
            reopened.get_items().await.unwrap(),
            vec![json!({"n": 3}), json!({"n": 2})]
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let driver = FileDriver::open(dir.path().join("nested"), &Namespace::new("a", "b"))
            .await
            .unwrap();
        assert!(driver.get_items().await.unwrap().is_empty());

        driver.set_item("k", json!(1)).await.unwrap();
        assert!(dir.path().join("nested").join("a_b.json").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_driver_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a_b.json"), "{oops").unwrap();

        let err = FileDriver::open(dir.path(), &Namespace::new("a", "b"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, CellarError::Driver { .. }));
    }

    #[tokio::test]
    async fn test_clear_and_remove_persist() {
        let dir = TempDir::new().unwrap();
        let ns = Namespace::new("a", "b");
        let driver = FileDriver::open(dir.path(), &ns).await.unwrap();
        driver.set_item("x", json!(1)).await.unwrap();
        driver.set_item("y", json!(2)).await.unwrap();
        driver.remove_item("x").await.unwrap();

        let reopened = FileDriver::open(dir.path(), &ns).await.unwrap();
        assert_eq!(reopened.get_items().await.unwrap(), vec![json!(2)]);

        reopened.clear().await.unwrap();
        let again = FileDriver::open(dir.path(), &ns).await.unwrap();
        assert!(again.get_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_entries_unchanged() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("sub");
        let ns = Namespace::new("a", "b");
        let driver = FileDriver::open(&data_dir, &ns).await.unwrap();
        driver.set_item("kept", json!(0)).await.unwrap();

        // Replace the data directory with a regular file so writes fail.
        std::fs::remove_dir_all(&data_dir).unwrap();
        std::fs::write(&data_dir, "not a directory").unwrap();

        assert!(driver.set_item("k", json!(1)).await.is_err());
        assert_eq!(driver.get_item("k").await.unwrap(), None);

        assert!(driver.remove_item("kept").await.is_err());
        assert_eq!(driver.get_item("kept").await.unwrap(), Some(json!(0)));

        assert!(driver.clear().await.is_err());
        assert_eq!(driver.get_items().await.unwrap(), vec![json!(0)]);
    }

    #[tokio::test]
    async fn test_underscored_namespaces_use_separate_files() {
        let dir = TempDir::new().unwrap();
        let opener = FileOpener::new(dir.path());
        let a = opener.open(&Namespace::new("hoge", "foo_bak")).await.unwrap();
        let b = opener.open(&Namespace::new("hoge_foo", "bak")).await.unwrap();

        a.set_item("x", json!(1)).await.unwrap();
        b.set_item("y", json!(2)).await.unwrap();

        let reopened = FileDriver::open(dir.path(), &Namespace::new("hoge", "foo_bak"))
            .await
            .unwrap();
        assert_eq!(reopened.get_items().await.unwrap(), vec![json!(1)]);
        assert_eq!(a.get_items().await.unwrap(), vec![json!(1)]);
        assert_eq!(b.get_items().await.unwrap(), vec![json!(2)]);
    }
}
