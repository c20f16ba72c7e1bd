//! Factory for creating driver openers and configured stores.

use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use cellar_core::config::{DriverConfig, DriverProvider, StoreConfig};
use cellar_core::error::{CellarError, CellarResult};
use cellar_core::store::{StoreOptions, VersionedStore};
use cellar_core::traits::DriverOpener;

use crate::file::FileOpener;
use crate::memory::MemoryOpener;
use crate::sink::DirectorySink;

/// Factory for creating driver openers.
pub struct DriverFactory;

impl DriverFactory {
    /// Create an opener for the configured backend.
    ///
    /// The file driver defaults to the cellar data directory; the sqlite
    /// driver defaults to `cellar.db` inside it.
    pub fn create(config: &DriverConfig) -> CellarResult<Arc<dyn DriverOpener>> {
        match config.provider {
            DriverProvider::Memory => Ok(Arc::new(MemoryOpener::new())),

            DriverProvider::File => {
                let dir = config
                    .path
                    .clone()
                    .unwrap_or_else(StoreConfig::default_data_dir);
                Ok(Arc::new(FileOpener::new(dir)))
            }

            #[cfg(feature = "sqlite")]
            DriverProvider::Sqlite => {
                let path = config
                    .path
                    .clone()
                    .unwrap_or_else(|| StoreConfig::default_data_dir().join("cellar.db"));
                Ok(Arc::new(crate::sqlite::SqliteOpener::new(path)?))
            }

            #[allow(unreachable_patterns)]
            other => Err(CellarError::UnsupportedDriver {
                driver: format!("{:?}", other),
            }),
        }
    }

    /// Create an in-memory opener.
    pub fn memory() -> Arc<dyn DriverOpener> {
        Arc::new(MemoryOpener::new())
    }

    /// Create a file opener rooted at `dir`.
    pub fn file(dir: impl Into<PathBuf>) -> Arc<dyn DriverOpener> {
        Arc::new(FileOpener::new(dir))
    }
}

/// Build a [`VersionedStore`] from configuration.
///
/// Opens the live and backup namespaces through the configured driver and
/// wires a [`DirectorySink`] when `export_dir` is set. Key derivation and
/// the type gate keep their defaults.
pub async fn open_store<T>(config: &StoreConfig) -> CellarResult<VersionedStore<T>>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    config.validate()?;
    let opener = DriverFactory::create(&config.driver)?;
    open_store_with(config, StoreOptions::from_config(config), opener.as_ref()).await
}

/// Like [`open_store`], starting from caller-built options.
///
/// `options` keeps its key derivation, type gate and hash; the download
/// sink is filled in from `export_dir` when the options carry none.
pub async fn open_store_with<T>(
    config: &StoreConfig,
    mut options: StoreOptions<T>,
    opener: &dyn DriverOpener,
) -> CellarResult<VersionedStore<T>>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    if options.download_sink.is_none() {
        if let Some(dir) = &config.export_dir {
            options.download_sink = Some(Arc::new(DirectorySink::new(dir.clone())));
        }
    }
    tracing::info!(
        "Opening store '{}_{}' with {:?} driver",
        config.name,
        config.store_name,
        config.driver.provider
    );
    VersionedStore::open(options, opener).await
}
