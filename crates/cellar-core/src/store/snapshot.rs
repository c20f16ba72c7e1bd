//! Snapshot protocol: content-addressed backups and restore.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CellarError, CellarResult};
use crate::store::VersionedStore;
use crate::types::{latest_backup, BackupData, ImportOutcome};

impl<T> VersionedStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Store `json` as a snapshot keyed by its content hash and return the key.
    ///
    /// Backing up identical text twice yields the same key; the second call
    /// replaces the first entry and refreshes its timestamp.
    pub async fn backup(&self, json: &str) -> CellarResult<String> {
        let key = (self.content_hash)(json);
        let data = BackupData::new(key.clone(), self.clock.timestamp(), json);
        self.backup_store
            .set_item(&key, serde_json::to_value(&data)?)
            .await?;
        tracing::info!("Backed up '{}' as {}", self.namespace, key);
        Ok(key)
    }

    /// Every snapshot, in driver order.
    pub async fn get_all_backup(&self) -> CellarResult<Vec<BackupData>> {
        self.backup_store
            .get_items()
            .await?
            .into_iter()
            .map(|value| decode_backup("<list>", value))
            .collect()
    }

    /// Key of the most recent snapshot, or `""` when there are none.
    pub async fn get_latest_backup_key(&self) -> CellarResult<String> {
        let backups = self.get_all_backup().await?;
        Ok(latest_backup(&backups)
            .map(|b| b.key.clone())
            .unwrap_or_default())
    }

    /// The snapshot stored under `key`, if any.
    pub async fn get_backup(&self, key: &str) -> CellarResult<Option<BackupData>> {
        match self.backup_store.get_item(key).await? {
            Some(value) => Ok(Some(decode_backup(key, value)?)),
            None => Ok(None),
        }
    }

    /// Replace the live store with the snapshot under `backup_key`.
    ///
    /// Runs `import_json` on the snapshot, so the current live state is
    /// itself backed up first and the returned key undoes the restore. A
    /// missing snapshot leaves the live store untouched and returns an
    /// empty key with `CellarError::BackupNotFound`.
    pub async fn restore(&self, backup_key: &str) -> ImportOutcome {
        let backup = match self.get_backup(backup_key).await {
            Ok(Some(backup)) => backup,
            Ok(None) => {
                tracing::warn!("Restore of '{}' failed: no backup {}", self.namespace, backup_key);
                return ImportOutcome::failed("", CellarError::backup_not_found(backup_key));
            }
            Err(e) => return ImportOutcome::failed("", e),
        };

        let outcome = self.import_json(&backup.json).await;
        match outcome.error {
            None => {
                tracing::info!(
                    "Restored '{}' from {} (previous state in {})",
                    self.namespace,
                    backup_key,
                    outcome.backup_key
                );
                outcome
            }
            Some(err) => {
                ImportOutcome::failed(outcome.backup_key, CellarError::restore_failed(err))
            }
        }
    }
}

fn decode_backup(key: &str, value: Value) -> CellarResult<BackupData> {
    serde_json::from_value(value).map_err(|e| CellarError::corrupt_value(key, e))
}

#[cfg(test)]
mod tests {
    use crate::error::{CellarError, ErrorCode};
    use crate::hash::md5_hex;
    use crate::store::test_support::{
        person, person_options, person_store, MockDriver, Person, VecDriver,
    };
    use crate::store::VersionedStore;
    use crate::traits::StoreDriver;
    use crate::types::DataContainer;
    use serde_json::json;
    use std::sync::Arc;

    fn records_json(people: &[(&str, u32)]) -> String {
        let records: Vec<DataContainer<Person>> = people
            .iter()
            .map(|(name, age)| {
                DataContainer::new(*name, "2024-01-01T00:00:00.000Z", person(name, *age))
            })
            .collect();
        serde_json::to_string(&records).unwrap()
    }

    fn ages(json: &str) -> Vec<u32> {
        let records: Vec<DataContainer<Person>> = serde_json::from_str(json).unwrap();
        records.into_iter().map(|r| r.data.age).collect()
    }

    #[tokio::test]
    async fn test_backup_is_content_addressed() {
        let store = person_store();
        let key = store.backup("[]").await.unwrap();
        assert_eq!(key, md5_hex("[]"));

        let again = store.backup("[]").await.unwrap();
        assert_eq!(again, key);
        assert_eq!(store.get_all_backup().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rebackup_refreshes_timestamp() {
        let store = person_store();
        let key = store.backup("[]").await.unwrap();
        let first = store.get_backup(&key).await.unwrap().unwrap();
        store.backup("[]").await.unwrap();
        let second = store.get_backup(&key).await.unwrap().unwrap();
        assert!(second.stored_instant() > first.stored_instant());
    }

    #[tokio::test]
    async fn test_get_all_backup_empty() {
        let store = person_store();
        assert!(store.get_all_backup().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_latest_backup_key_empty() {
        let store = person_store();
        assert_eq!(store.get_latest_backup_key().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_latest_backup_key_without_sleeping() {
        let store = person_store();
        let keys: Vec<String> = backup_all(&store, &["[]", "[1]", "[2]", "[3]"]).await;
        assert_eq!(store.get_latest_backup_key().await.unwrap(), keys[3]);
    }

    async fn backup_all(store: &VersionedStore<Person>, texts: &[&str]) -> Vec<String> {
        let mut keys = Vec::new();
        for text in texts {
            keys.push(store.backup(text).await.unwrap());
        }
        keys
    }

    #[tokio::test]
    async fn test_get_backup_missing_is_none() {
        let store = person_store();
        assert!(store.get_backup("agaga").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_unknown_key() {
        let store = person_store();
        store.set_item(person("Taro", 20), None).await.unwrap();

        let outcome = store.restore("agaga").await;
        assert_eq!(outcome.backup_key, "");
        assert_eq!(outcome.error.unwrap().code(), ErrorCode::BakNotFound);
        assert_eq!(store.get_items().await.unwrap().len(), 1);
        assert!(store.get_all_backup().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_then_restore_round_trip() {
        let store = person_store();
        store.set_item(person("Taro", 20), None).await.unwrap();

        let outcome = store.import_json(&records_json(&[("Taro", 25)])).await;
        assert!(outcome.is_ok());
        let before_import = outcome.backup_key;
        assert_eq!(store.get_item("Taro").await.unwrap().unwrap().data.age, 25);

        let restored = store.restore(&before_import).await;
        assert!(restored.is_ok());
        assert_eq!(store.get_item("Taro").await.unwrap().unwrap().data.age, 20);

        let undo = store.get_backup(&restored.backup_key).await.unwrap().unwrap();
        assert_eq!(ages(&undo.json), vec![25]);
    }

    #[tokio::test]
    async fn test_restore_latest_after_three_imports() {
        let store = person_store();
        let data1 = records_json(&[("Taro", 20), ("Hanako", 50)]);
        let data2 = records_json(&[("Taro", 25), ("Hanako", 55)]);

        store.import_json(&data1).await.into_result().unwrap();
        store.import_json(&data2).await.into_result().unwrap();
        store.import_json(&data1).await.into_result().unwrap();

        // The latest snapshot holds data2.
        let latest = store.get_latest_backup_key().await.unwrap();
        let outcome = store.restore(&latest).await;
        assert!(outcome.is_ok());

        // Restoring backed up the live data1 again, under data1's content key.
        let live_json = store.export_json().await.unwrap();
        assert_eq!(ages(&live_json), vec![25, 55]);
        assert_eq!(outcome.backup_key, md5_hex(&data1));
    }

    #[tokio::test]
    async fn test_restore_of_broken_snapshot_forwards_key() {
        let backup = VecDriver::shared();
        let store =
            VersionedStore::with_drivers(person_options(), VecDriver::shared(), backup.clone());
        backup
            .set_item(
                "broken",
                json!({
                    "key": "broken",
                    "storedAt": "2024-01-01T00:00:00.000Z",
                    "json": "{\"not\": \"an array\"}",
                }),
            )
            .await
            .unwrap();
        store.set_item(person("Taro", 20), None).await.unwrap();

        let outcome = store.restore("broken").await;
        assert!(!outcome.backup_key.is_empty());
        let err = outcome.error.unwrap();
        assert_eq!(err.code(), ErrorCode::BakRestoreFailed);
        match &err {
            CellarError::RestoreFailed { source } => {
                assert!(matches!(**source, CellarError::Format { .. }))
            }
            other => panic!("unexpected error {:?}", other),
        }

        // The forwarded key undoes the failed restore.
        store.restore(&outcome.backup_key).await.into_result().unwrap();
        assert_eq!(store.get_item("Taro").await.unwrap().unwrap().data.age, 20);
    }

    #[tokio::test]
    async fn test_backup_driver_failure_surfaces() {
        let mut backup = MockDriver::new();
        backup
            .expect_set_item()
            .returning(|_, _| Err(CellarError::driver("backup volume offline")));
        let store =
            VersionedStore::with_drivers(person_options(), VecDriver::shared(), Arc::new(backup));

        let err = store.backup("[]").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::DrvOperationFailed);
    }
}
