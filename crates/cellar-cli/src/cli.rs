//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cellar")]
#[command(version)]
#[command(about = "Versioned key-value store with snapshot backups", long_about = None)]
pub struct Cli {
    /// Configuration file (.toml, .json or .yaml); defaults to CELLAR_* environment variables
    #[arg(short, long, global = true, env = "CELLAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the live store name
    #[arg(short, long, global = true)]
    pub store: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store a JSON value
    Set {
        /// Value as JSON; text that is not valid JSON is stored as a string
        value: String,

        /// Record key (defaults to the content hash of the value)
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Print the record under a key
    Get { key: String },

    /// Print every record
    List,

    /// Delete the record under a key
    Remove { key: String },

    /// Delete every record
    Clear,

    /// Export the store as JSON
    Export {
        /// Write to the export directory instead of stdout
        #[arg(short, long)]
        file: bool,

        /// File name to use with --file
        #[arg(short, long, requires = "file")]
        name: Option<String>,
    },

    /// Replace the store with the records in a JSON file
    Import {
        /// File holding a JSON array of records
        path: PathBuf,

        /// Validate every record before touching the store
        #[arg(long)]
        strict: bool,
    },

    /// List snapshots
    Backups,

    /// Print the key of the latest snapshot
    Latest,

    /// Replace the store with a snapshot
    Restore { key: String },
}
