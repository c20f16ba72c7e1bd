//! Versioned store: record access and hook registration.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ImportMode;
use crate::error::{CellarError, CellarResult};
use crate::hash::{content_key, md5_hex};
use crate::store::clock::MonotonicClock;
use crate::store::hooks::{HookKind, StoreHooks};
use crate::store::options::{ContentHash, ProvideKey, StoreOptions, TypePredicate};
use crate::traits::{DownloadSink, DriverOpener, Namespace, StoreDriver};
use crate::types::{DataContainer, ImportOutcome};

/// Typed records over a live driver, with content-addressed snapshots in a
/// second driver.
///
/// The store assumes a single logical writer. It takes no locks around
/// driver calls, so concurrent `import_json` or `restore` calls on the same
/// instance interleave at the driver with last-writer-wins results.
pub struct VersionedStore<T> {
    pub(crate) namespace: Namespace,
    pub(crate) store: Arc<dyn StoreDriver>,
    pub(crate) backup_store: Arc<dyn StoreDriver>,
    pub(crate) download_sink: Option<Arc<dyn DownloadSink>>,
    pub(crate) confirm_type: Option<TypePredicate>,
    pub(crate) provide_key: ProvideKey<T>,
    pub(crate) content_hash: ContentHash,
    pub(crate) import_mode: ImportMode,
    pub(crate) clock: MonotonicClock,
    pub(crate) hooks: StoreHooks<T>,
}

impl<T> VersionedStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Open the live and backup namespaces through `opener` and build a store.
    ///
    /// Fails with [`CellarError::Configuration`] before opening anything if
    /// the backup suffix is empty.
    pub async fn open(options: StoreOptions<T>, opener: &dyn DriverOpener) -> CellarResult<Self> {
        if options.backup_suffix.is_empty() {
            return Err(CellarError::Configuration(format!(
                "Backup suffix for '{}' must not be empty",
                options.namespace
            )));
        }
        let backup_ns = options.namespace.with_suffix(&options.backup_suffix);
        let live = opener.open(&options.namespace).await?;
        let backup = opener.open(&backup_ns).await?;
        tracing::debug!("Opened store '{}' with backups in '{}'", options.namespace, backup_ns);
        Ok(Self::with_drivers(options, live, backup))
    }

    /// Build a store over already-open drivers.
    pub fn with_drivers(
        options: StoreOptions<T>,
        store: Arc<dyn StoreDriver>,
        backup_store: Arc<dyn StoreDriver>,
    ) -> Self {
        Self {
            namespace: options.namespace,
            store,
            backup_store,
            download_sink: options.download_sink,
            confirm_type: options.confirm_type,
            provide_key: options
                .provide_key
                .unwrap_or_else(|| Arc::new(|value: &T| content_key(value))),
            content_hash: options
                .content_hash
                .unwrap_or_else(|| Arc::new(|text: &str| md5_hex(text))),
            import_mode: options.import_mode,
            clock: MonotonicClock::new(),
            hooks: StoreHooks::new(),
        }
    }

    /// Database name.
    pub fn name(&self) -> &str {
        &self.namespace.name
    }

    /// Live store name.
    pub fn store_name(&self) -> &str {
        &self.namespace.store_name
    }

    /// Live namespace.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Import mode in effect.
    pub fn import_mode(&self) -> ImportMode {
        self.import_mode
    }

    /// Store `value` under `key`, or under the derived key when `key` is `None`.
    ///
    /// The record is stamped with the current time. A value rejected by the
    /// type gate is returned as `CellarError::TypeValidation` and not written.
    pub async fn set_item(&self, value: T, key: Option<&str>) -> CellarResult<DataContainer<T>> {
        let real_key = match key {
            Some(k) => k.to_string(),
            None => (self.provide_key)(&value),
        };
        let result = match serde_json::to_value(&value) {
            Ok(data) => {
                let record = DataContainer::new(real_key.clone(), self.clock.timestamp(), data);
                self.set_item_core(record).await
            }
            Err(e) => Err(e.into()),
        };

        if let Some(hook) = self.hooks.set_item.get() {
            hook(&real_key, &result);
        }
        result
    }

    /// Get the record under `key`.
    pub async fn get_item(&self, key: &str) -> CellarResult<Option<DataContainer<T>>> {
        let result = match self.store.get_item(key).await? {
            Some(value) => Some(decode_record(key, value)?),
            None => None,
        };

        if let Some(hook) = self.hooks.get_item.get() {
            hook(key, result.as_ref());
        }
        Ok(result)
    }

    /// Get every record, in driver order.
    pub async fn get_items(&self) -> CellarResult<Vec<DataContainer<T>>> {
        let result = self
            .store
            .get_items()
            .await?
            .into_iter()
            .map(|value| decode_record("<list>", value))
            .collect::<CellarResult<Vec<_>>>()?;

        if let Some(hook) = self.hooks.get_items.get() {
            hook(&result);
        }
        Ok(result)
    }

    /// Delete the record under `key`.
    pub async fn remove_item(&self, key: &str) -> CellarResult<()> {
        self.store.remove_item(key).await?;
        if let Some(hook) = self.hooks.remove_item.get() {
            hook(key);
        }
        Ok(())
    }

    /// Delete every live record. Snapshots are untouched.
    pub async fn clear(&self) -> CellarResult<()> {
        self.store.clear().await?;
        if let Some(hook) = self.hooks.clear.get() {
            hook();
        }
        Ok(())
    }

    /// Check a JSON value against the type gate and decode it as `T`.
    pub(crate) fn confirm_type(&self, data: &Value) -> CellarResult<T> {
        if let Some(predicate) = &self.confirm_type {
            if !predicate(data) {
                return Err(CellarError::type_validation("typeof value is wrong"));
            }
        }
        serde_json::from_value(data.clone()).map_err(|e| {
            CellarError::type_validation(format!("value does not match the store type: {}", e))
        })
    }

    /// Gate and write a complete record without firing hooks.
    pub(crate) async fn set_item_core(
        &self,
        record: DataContainer<Value>,
    ) -> CellarResult<DataContainer<T>> {
        let data = self.confirm_type(&record.data)?;
        let value = serde_json::to_value(&record)?;
        self.store.set_item(&record.key, value).await?;
        tracing::debug!("Stored '{}' in '{}'", record.key, self.namespace);
        Ok(DataContainer {
            key: record.key,
            stored_at: record.stored_at,
            data,
        })
    }

    /// Observe `set_item`. Receives the key and the stored record or error.
    pub fn on_set_item(
        &self,
        hook: impl Fn(&str, &CellarResult<DataContainer<T>>) + Send + Sync + 'static,
    ) {
        self.hooks.set_item.set(Some(Arc::new(hook)));
    }

    /// Observe `get_item`. Receives the key and the record, if found.
    pub fn on_get_item(
        &self,
        hook: impl Fn(&str, Option<&DataContainer<T>>) + Send + Sync + 'static,
    ) {
        self.hooks.get_item.set(Some(Arc::new(hook)));
    }

    /// Observe `get_items`.
    pub fn on_get_items(&self, hook: impl Fn(&[DataContainer<T>]) + Send + Sync + 'static) {
        self.hooks.get_items.set(Some(Arc::new(hook)));
    }

    /// Observe `remove_item`.
    pub fn on_remove_item(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
        self.hooks.remove_item.set(Some(Arc::new(hook)));
    }

    /// Observe `clear`.
    pub fn on_clear(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.hooks.clear.set(Some(Arc::new(hook)));
    }

    /// Observe `import_json`. Receives the final outcome once per import.
    pub fn on_import_json(&self, hook: impl Fn(&ImportOutcome) + Send + Sync + 'static) {
        self.hooks.import_json.set(Some(Arc::new(hook)));
    }

    /// Observe `export_json`. Receives the exported text.
    pub fn on_export_json(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
        self.hooks.export_json.set(Some(Arc::new(hook)));
    }

    /// Remove the hook for `kind`, if any.
    pub fn clear_hook(&self, kind: HookKind) {
        self.hooks.remove(kind);
    }

    /// Whether a hook is registered for `kind`.
    pub fn has_hook(&self, kind: HookKind) -> bool {
        self.hooks.is_set(kind)
    }
}

fn decode_record<T: DeserializeOwned>(key: &str, value: Value) -> CellarResult<DataContainer<T>> {
    serde_json::from_value(value).map_err(|e| CellarError::corrupt_value(key, e))
}
