//! Error types for cellar operations.
//!
//! Every public operation reports failure as a value: either a
//! [`CellarResult`] or an [`ImportOutcome`](crate::types::ImportOutcome)
//! that carries the error next to the backup key. Each variant maps to a
//! stable [`ErrorCode`] for programmatic handling.

use thiserror::Error;

/// Result type alias for cellar operations.
pub type CellarResult<T> = Result<T, CellarError>;

/// Main error type for all cellar operations.
#[derive(Error, Debug)]
pub enum CellarError {
    /// A value was rejected by the store's type gate.
    #[error("Type validation error: {message}")]
    TypeValidation { message: String, code: ErrorCode },

    /// Imported text was not valid JSON.
    #[error("Parse error: {message}")]
    Parse { message: String, code: ErrorCode },

    /// Imported JSON parsed but was not an array of records.
    #[error("Format error: {message}")]
    Format { message: String, code: ErrorCode },

    /// An element of an imported array was not a record.
    #[error("Invalid record at index {index}: {message}")]
    ItemFormat {
        index: usize,
        message: String,
        code: ErrorCode,
    },

    /// No snapshot is stored under the requested key.
    #[error("Backup not found: no data of key '{key}'")]
    BackupNotFound { key: String, code: ErrorCode },

    /// Re-importing a snapshot failed; the live store may be partially written.
    #[error("Restore failed: backup data are broken: {source}")]
    RestoreFailed {
        #[source]
        source: Box<CellarError>,
    },

    /// `export_json_file` was called on a store without a download sink.
    #[error("Download sink is not configured")]
    DownloadSinkUnconfigured,

    /// The download sink rejected the export.
    #[error("Download error: {message}")]
    Download {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The storage driver failed.
    #[error("Driver error: {message}")]
    Driver {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Driver provider not supported by this build.
    #[error("Driver not supported: {driver}")]
    UnsupportedDriver { driver: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation (VAL_xxx)
    ValTypeMismatch,
    ValInvalidRecord,

    // Import (IMP_xxx)
    ImpInvalidJson,
    ImpNotAnArray,

    // Backup (BAK_xxx)
    BakNotFound,
    BakRestoreFailed,

    // Export (EXP_xxx)
    ExpSinkUnconfigured,
    ExpDownloadFailed,

    // Driver (DRV_xxx)
    DrvOperationFailed,
    DrvConnectionFailed,
    DrvCorruptValue,

    // Configuration (CFG_xxx)
    CfgInvalid,
    CfgUnsupportedDriver,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValTypeMismatch => "VAL_001",
            ErrorCode::ValInvalidRecord => "VAL_002",
            ErrorCode::ImpInvalidJson => "IMP_001",
            ErrorCode::ImpNotAnArray => "IMP_002",
            ErrorCode::BakNotFound => "BAK_001",
            ErrorCode::BakRestoreFailed => "BAK_002",
            ErrorCode::ExpSinkUnconfigured => "EXP_001",
            ErrorCode::ExpDownloadFailed => "EXP_002",
            ErrorCode::DrvOperationFailed => "DRV_001",
            ErrorCode::DrvConnectionFailed => "DRV_002",
            ErrorCode::DrvCorruptValue => "DRV_003",
            ErrorCode::CfgInvalid => "CFG_001",
            ErrorCode::CfgUnsupportedDriver => "CFG_002",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl CellarError {
    /// Create a type validation error.
    pub fn type_validation(message: impl Into<String>) -> Self {
        Self::TypeValidation {
            message: message.into(),
            code: ErrorCode::ValTypeMismatch,
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ImpInvalidJson,
        }
    }

    /// Create a format error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
            code: ErrorCode::ImpNotAnArray,
        }
    }

    /// Create an item format error for the element at `index`.
    pub fn item_format(index: usize, message: impl Into<String>) -> Self {
        Self::ItemFormat {
            index,
            message: message.into(),
            code: ErrorCode::ValInvalidRecord,
        }
    }

    /// Create a backup-not-found error.
    pub fn backup_not_found(key: impl Into<String>) -> Self {
        Self::BackupNotFound {
            key: key.into(),
            code: ErrorCode::BakNotFound,
        }
    }

    /// Wrap the error of a failed snapshot re-import.
    pub fn restore_failed(source: CellarError) -> Self {
        Self::RestoreFailed {
            source: Box::new(source),
        }
    }

    /// Create a download error.
    pub fn download(message: impl Into<String>) -> Self {
        Self::Download {
            message: message.into(),
            code: ErrorCode::ExpDownloadFailed,
            source: None,
        }
    }

    /// Create a driver error.
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
            code: ErrorCode::DrvOperationFailed,
            source: None,
        }
    }

    /// Create a driver error that keeps its underlying cause.
    pub fn driver_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Driver {
            message: message.into(),
            code: ErrorCode::DrvOperationFailed,
            source: Some(Box::new(source)),
        }
    }

    /// Create a driver error for a stored value that no longer decodes.
    pub fn corrupt_value(key: &str, err: serde_json::Error) -> Self {
        Self::Driver {
            message: format!("Stored value at '{}' could not be decoded: {}", key, err),
            code: ErrorCode::DrvCorruptValue,
            source: Some(Box::new(err)),
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::TypeValidation { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            Self::Format { code, .. } => *code,
            Self::ItemFormat { code, .. } => *code,
            Self::BackupNotFound { code, .. } => *code,
            Self::RestoreFailed { .. } => ErrorCode::BakRestoreFailed,
            Self::DownloadSinkUnconfigured => ErrorCode::ExpSinkUnconfigured,
            Self::Download { code, .. } => *code,
            Self::Driver { code, .. } => *code,
            Self::Configuration(_) => ErrorCode::CfgInvalid,
            Self::UnsupportedDriver { .. } => ErrorCode::CfgUnsupportedDriver,
            Self::Serialization(_) => ErrorCode::DrvCorruptValue,
            Self::Io(_) => ErrorCode::Internal,
        }
    }

    /// Get a user-facing hint for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::TypeValidation { .. } => {
                Some("Check the value against the store's type predicate")
            }
            Self::Parse { .. } | Self::Format { .. } | Self::ItemFormat { .. } => Some(
                "Import only JSON produced by export_json; \
                 restore the returned backup key to roll back",
            ),
            Self::BackupNotFound { .. } => Some("List available snapshots with get_all_backup"),
            Self::RestoreFailed { .. } => {
                Some("Restore the backup key returned alongside this error")
            }
            Self::DownloadSinkUnconfigured => Some("Configure a download sink or set export_dir"),
            _ => None,
        }
    }
}
