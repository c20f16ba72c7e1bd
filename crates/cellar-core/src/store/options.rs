//! Construction options for a versioned store.

use std::sync::Arc;

use serde_json::Value;

use crate::config::{ImportMode, StoreConfig};
use crate::traits::{DownloadSink, Namespace};

/// Derives a record key from a value.
pub type ProvideKey<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// Gates writes: returns `false` for values the store must reject.
pub type TypePredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Maps serialized text to a short content key.
pub type ContentHash = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Options for [`VersionedStore`](super::VersionedStore).
///
/// Everything but the namespace is optional. Without `provide_key`, keys
/// are the content hash of the value's JSON; without `content_hash`, MD5
/// is used; without `confirm_type`, any value that decodes as `T` is
/// accepted.
pub struct StoreOptions<T> {
    /// Live namespace.
    pub namespace: Namespace,
    /// Appended to the live store name to name the backup namespace.
    pub backup_suffix: String,
    /// Import behaviour on invalid elements.
    pub import_mode: ImportMode,
    /// Destination for `export_json_file`.
    pub download_sink: Option<Arc<dyn DownloadSink>>,
    /// Write gate over the JSON form of each value.
    pub confirm_type: Option<TypePredicate>,
    /// Key derivation for `set_item` without an explicit key.
    pub provide_key: Option<ProvideKey<T>>,
    /// Snapshot key and export file name hash.
    pub content_hash: Option<ContentHash>,
}

impl<T> StoreOptions<T> {
    /// Options for the namespace `name`/`store_name` with defaults elsewhere.
    pub fn new(name: impl Into<String>, store_name: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::new(name, store_name),
            backup_suffix: "_bak".to_string(),
            import_mode: ImportMode::default(),
            download_sink: None,
            confirm_type: None,
            provide_key: None,
            content_hash: None,
        }
    }

    /// Options carrying the namespace, suffix and import mode of `config`.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            backup_suffix: config.backup_suffix.clone(),
            import_mode: config.import_mode,
            ..Self::new(config.name.clone(), config.store_name.clone())
        }
    }

    /// Set the backup namespace suffix. [`VersionedStore::open`] rejects an
    /// empty suffix.
    ///
    /// [`VersionedStore::open`]: crate::store::VersionedStore::open
    pub fn with_backup_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.backup_suffix = suffix.into();
        self
    }

    /// Set the import mode.
    pub fn with_import_mode(mut self, mode: ImportMode) -> Self {
        self.import_mode = mode;
        self
    }

    /// Set the download sink.
    pub fn with_download_sink(mut self, sink: Arc<dyn DownloadSink>) -> Self {
        self.download_sink = Some(sink);
        self
    }

    /// Set the type predicate.
    pub fn with_confirm_type(
        mut self,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.confirm_type = Some(Arc::new(predicate));
        self
    }

    /// Set the key derivation function.
    pub fn with_provide_key(
        mut self,
        provide_key: impl Fn(&T) -> String + Send + Sync + 'static,
    ) -> Self {
        self.provide_key = Some(Arc::new(provide_key));
        self
    }

    /// Set the content hash function.
    pub fn with_content_hash(
        mut self,
        hash: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.content_hash = Some(Arc::new(hash));
        self
    }
}
