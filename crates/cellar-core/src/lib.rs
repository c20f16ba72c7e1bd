//! cellar-core - Core library for cellar.
//!
//! This crate provides the record and snapshot types, the driver traits,
//! and [`VersionedStore`], a typed key-value store that keeps
//! content-addressed snapshots of its state in a second namespace.
//!
//! # Example
//!
//! ```ignore
//! use cellar_core::{StoreOptions, VersionedStore};
//!
//! let options = StoreOptions::<Person>::new("hoge", "foo")
//!     .with_provide_key(|p: &Person| p.name.clone());
//! let store = VersionedStore::open(options, &opener).await?;
//!
//! store.set_item(taro, None).await?;
//! let outcome = store.import_json(&payload).await;
//! store.restore(&outcome.backup_key).await.into_result()?;
//! ```

pub mod config;
pub mod error;
pub mod hash;
pub mod store;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{DriverConfig, DriverProvider, ImportMode, StoreConfig};
pub use error::{CellarError, CellarResult, ErrorCode};
pub use store::{HookKind, StoreOptions, VersionedStore};
pub use traits::{DownloadSink, DriverOpener, Namespace, StoreDriver};
pub use types::{latest_backup, BackupData, DataContainer, ImportOutcome};
