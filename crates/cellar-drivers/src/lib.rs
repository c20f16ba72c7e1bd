//! cellar-drivers - Storage drivers and download sinks for cellar.
//!
//! # Supported Backends
//!
//! - **Memory** - insertion-ordered map in process memory
//! - **File** - one JSON file per namespace
//! - **SQLite** (feature: `sqlite`, default) - one table per namespace
//!
//! # Example
//!
//! ```ignore
//! use cellar_core::StoreConfig;
//! use cellar_drivers::open_store;
//!
//! let config = StoreConfig::from_env()?;
//! let store = open_store::<serde_json::Value>(&config).await?;
//! ```

mod factory;
mod file;
mod memory;
mod sink;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use factory::{open_store, open_store_with, DriverFactory};
pub use file::{FileDriver, FileOpener};
pub use memory::{MemoryDriver, MemoryOpener};
pub use sink::DirectorySink;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteDriver, SqliteOpener};
