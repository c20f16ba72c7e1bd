//! cellar - command-line front end for a versioned store.

mod cli;

use anyhow::{Context, Result};
use cellar_core::config::{DriverProvider, ImportMode, StoreConfig};
use cellar_core::VersionedStore;
use cellar_drivers::open_store;
use clap::Parser;
use serde_json::Value;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::cli::{Cli, Commands};

fn load_config(cli: &Cli) -> Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => StoreConfig::from_env().context("Invalid CELLAR_* environment")?,
    };
    if let Some(store) = &cli.store {
        config.store_name = store.clone();
    }
    match &cli.command {
        Commands::Import { strict: true, .. } => config.import_mode = ImportMode::AllOrNothing,
        Commands::Export { file: true, .. } if config.export_dir.is_none() => {
            config.export_dir = Some(std::env::current_dir()?);
        }
        _ => {}
    }
    config.validate()?;
    Ok(config)
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli, store: VersionedStore<Value>) -> Result<()> {
    match cli.command {
        Commands::Set { value, key } => {
            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            let record = store.set_item(value, key.as_deref()).await?;
            print_json(&record)?;
        }
        Commands::Get { key } => match store.get_item(&key).await? {
            Some(record) => print_json(&record)?,
            None => anyhow::bail!("No record under '{}'", key),
        },
        Commands::List => {
            print_json(&store.get_items().await?)?;
        }
        Commands::Remove { key } => {
            store.remove_item(&key).await?;
        }
        Commands::Clear => {
            store.clear().await?;
        }
        Commands::Export { file: false, .. } => {
            println!("{}", store.export_json().await?);
        }
        Commands::Export { file: true, name } => {
            let name = store.export_json_file(name.as_deref()).await?;
            println!("{}", name);
        }
        Commands::Import { path, .. } => {
            let json = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let outcome = store.import_json(&json).await;
            println!("{}", outcome.backup_key);
            outcome
                .into_result()
                .context("Import failed; restore the printed backup key to undo")?;
        }
        Commands::Backups => {
            for backup in store.get_all_backup().await? {
                println!("{}\t{}", backup.key, backup.stored_at);
            }
        }
        Commands::Latest => {
            println!("{}", store.get_latest_backup_key().await?);
        }
        Commands::Restore { key } => {
            let outcome = store.restore(&key).await;
            println!("{}", outcome.backup_key);
            outcome.into_result().context("Restore failed")?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays parseable.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
                .add_directive("cellar=debug".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    if config.driver.provider == DriverProvider::Memory {
        warn!("Using the memory driver; nothing persists after this command");
    }

    let store = open_store::<Value>(&config).await?;
    info!("Store '{}' ready", store.namespace());
    run(cli, store).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("cellar").chain(args.iter().copied()))
    }

    #[test]
    fn test_load_config_from_file_with_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cellar.toml");
        std::fs::write(&path, "name = \"hoge\"\nstore_name = \"foo\"\n").unwrap();
        let path = path.to_string_lossy().to_string();

        let cli = parse(&[
            "--config",
            path.as_str(),
            "--store",
            "bar",
            "import",
            "x.json",
            "--strict",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.name, "hoge");
        assert_eq!(config.store_name, "bar");
        assert_eq!(config.import_mode, ImportMode::AllOrNothing);
    }

    #[tokio::test]
    async fn test_run_set_then_import() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::builder()
            .driver(DriverProvider::File, Some(dir.path().to_path_buf()))
            .build()
            .unwrap();

        let store = open_store::<Value>(&config).await.unwrap();
        run(parse(&["set", "{\"a\": 1}", "--key", "k"]), store).await.unwrap();

        let dump = dir.path().join("dump.json");
        std::fs::write(
            &dump,
            "[{\"key\": \"z\", \"storedAt\": \"2024-01-01T00:00:00.000Z\", \"data\": 2}]",
        )
        .unwrap();
        let dump = dump.to_string_lossy().to_string();
        let store = open_store::<Value>(&config).await.unwrap();
        run(parse(&["import", dump.as_str()]), store).await.unwrap();

        let store = open_store::<Value>(&config).await.unwrap();
        let items = store.get_items().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].key, "z");
        assert_eq!(store.get_all_backup().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_run_import_failure_is_error() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::builder()
            .driver(DriverProvider::File, Some(dir.path().to_path_buf()))
            .build()
            .unwrap();
        let dump = dir.path().join("bad.json");
        std::fs::write(&dump, "{}").unwrap();

        let dump = dump.to_string_lossy().to_string();
        let store = open_store::<Value>(&config).await.unwrap();
        assert!(run(parse(&["import", dump.as_str()]), store).await.is_err());
    }
}
