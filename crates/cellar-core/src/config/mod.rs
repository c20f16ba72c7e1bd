//! Configuration system for cellar.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{CellarError, CellarResult};

/// Storage driver provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DriverProvider {
    /// Process-local map; contents vanish with the process.
    #[default]
    Memory,
    /// One JSON file per namespace.
    File,
    /// SQLite database, one table per namespace.
    Sqlite,
}

impl DriverProvider {
    /// Parse a provider name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "memory" | "mem" => Some(Self::Memory),
            "file" | "json" => Some(Self::File),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

/// How `import_json` treats a payload with an invalid element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// Clear, then write elements in order; stop at the first bad element
    /// and keep everything written before it.
    #[default]
    PartialApply,
    /// Validate every element first; on failure leave the live store as it was.
    AllOrNothing,
}

/// Driver configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Which backend to use.
    pub provider: DriverProvider,
    /// Directory (file driver) or database file (sqlite driver).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Main store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database name shared by the live and backup namespaces.
    pub name: String,
    /// Live store name; also the prefix of exported file names.
    pub store_name: String,
    /// Appended to `store_name` to name the backup namespace.
    pub backup_suffix: String,
    /// Driver configuration.
    pub driver: DriverConfig,
    /// Import behaviour on invalid elements.
    pub import_mode: ImportMode,
    /// Directory that `export_json_file` writes to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "cellar".to_string(),
            store_name: "default".to_string(),
            backup_suffix: "_bak".to_string(),
            driver: DriverConfig::default(),
            import_mode: ImportMode::default(),
            export_dir: None,
        }
    }
}

impl StoreConfig {
    /// Default data directory (`~/.cellar`).
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".cellar"))
            .unwrap_or_else(|| PathBuf::from(".cellar"))
    }

    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> CellarResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        let config: Self = match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| CellarError::Configuration(e.to_string()))?
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| CellarError::Configuration(e.to_string()))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| CellarError::Configuration(e.to_string()))?,
            _ => {
                return Err(CellarError::Configuration(
                    "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
                ))
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> CellarResult<Self> {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("CELLAR_NAME") {
            config.name = name;
        }
        if let Ok(store_name) = std::env::var("CELLAR_STORE_NAME") {
            config.store_name = store_name;
        }
        if let Ok(provider) = std::env::var("CELLAR_DRIVER") {
            config.driver.provider = DriverProvider::parse(&provider).ok_or_else(|| {
                CellarError::Configuration(format!("Unknown driver '{}'", provider))
            })?;
        }
        if let Ok(path) = std::env::var("CELLAR_DATA_DIR") {
            config.driver.path = Some(PathBuf::from(path));
        }
        if let Ok(dir) = std::env::var("CELLAR_EXPORT_DIR") {
            config.export_dir = Some(PathBuf::from(dir));
        }
        if let Ok(mode) = std::env::var("CELLAR_IMPORT_MODE") {
            config.import_mode = match mode.to_lowercase().as_str() {
                "partial_apply" | "partial" => ImportMode::PartialApply,
                "all_or_nothing" | "strict" => ImportMode::AllOrNothing,
                other => {
                    return Err(CellarError::Configuration(format!(
                        "Unknown import mode '{}'",
                        other
                    )))
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants the store relies on.
    pub fn validate(&self) -> CellarResult<()> {
        if self.name.is_empty() {
            return Err(CellarError::Configuration("name must not be empty".to_string()));
        }
        if self.store_name.is_empty() {
            return Err(CellarError::Configuration(
                "store_name must not be empty".to_string(),
            ));
        }
        if self.backup_suffix.is_empty() {
            return Err(CellarError::Configuration(
                "backup_suffix must not be empty; live and backup namespaces would collide"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }
}

/// Builder for StoreConfig.
#[derive(Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set the database name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the live store name.
    pub fn store_name(mut self, store_name: impl Into<String>) -> Self {
        self.config.store_name = store_name.into();
        self
    }

    /// Set the backup namespace suffix.
    pub fn backup_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.backup_suffix = suffix.into();
        self
    }

    /// Set the driver provider and location.
    pub fn driver(mut self, provider: DriverProvider, path: Option<PathBuf>) -> Self {
        self.config.driver = DriverConfig { provider, path };
        self
    }

    /// Set the import mode.
    pub fn import_mode(mut self, mode: ImportMode) -> Self {
        self.config.import_mode = mode;
        self
    }

    /// Set the export directory.
    pub fn export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.export_dir = Some(dir.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> CellarResult<StoreConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.backup_suffix, "_bak");
        assert_eq!(config.driver.provider, DriverProvider::Memory);
        assert_eq!(config.import_mode, ImportMode::PartialApply);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::builder()
            .name("hoge")
            .store_name("foo")
            .driver(DriverProvider::File, Some(PathBuf::from("/tmp/cellar")))
            .import_mode(ImportMode::AllOrNothing)
            .build()
            .unwrap();
        assert_eq!(config.name, "hoge");
        assert_eq!(config.store_name, "foo");
        assert_eq!(config.driver.provider, DriverProvider::File);
        assert_eq!(config.import_mode, ImportMode::AllOrNothing);
    }

    #[test]
    fn test_builder_rejects_empty_suffix() {
        let result = StoreConfig::builder().backup_suffix("").build();
        assert!(matches!(result, Err(CellarError::Configuration(_))));
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
name = "hoge"
store_name = "foo"
import_mode = "all_or_nothing"

[driver]
provider = "sqlite"
path = "/var/lib/cellar/store.db"
"#
        )
        .unwrap();

        let config = StoreConfig::from_file(file.path()).unwrap();
        assert_eq!(config.name, "hoge");
        assert_eq!(config.backup_suffix, "_bak");
        assert_eq!(config.driver.provider, DriverProvider::Sqlite);
        assert_eq!(config.import_mode, ImportMode::AllOrNothing);
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "name: hoge\nstore_name: bar\ndriver:\n  provider: file\n").unwrap();

        let config = StoreConfig::from_file(file.path()).unwrap();
        assert_eq!(config.store_name, "bar");
        assert_eq!(config.driver.provider, DriverProvider::File);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(StoreConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_driver_provider_parse() {
        assert_eq!(DriverProvider::parse("SQLite"), Some(DriverProvider::Sqlite));
        assert_eq!(DriverProvider::parse("json"), Some(DriverProvider::File));
        assert_eq!(DriverProvider::parse("redis"), None);
    }
}
