//! Result of an import or restore.

use crate::error::{CellarError, CellarResult};

/// A backup key paired with the error, if any, of the operation that
/// produced it.
///
/// `import_json` and `restore` never roll back on their own. The backup
/// key names the snapshot taken just before the live store was touched,
/// so a caller that sees an error can pass it to `restore` to undo
/// whatever was partially applied.
#[derive(Debug)]
pub struct ImportOutcome {
    /// Key of the pre-operation snapshot. Empty when no snapshot was taken.
    pub backup_key: String,
    /// Failure of the operation, if it failed.
    pub error: Option<CellarError>,
}

impl ImportOutcome {
    /// A successful outcome.
    pub fn ok(backup_key: impl Into<String>) -> Self {
        Self {
            backup_key: backup_key.into(),
            error: None,
        }
    }

    /// A failed outcome that still reports the backup key.
    pub fn failed(backup_key: impl Into<String>, error: CellarError) -> Self {
        Self {
            backup_key: backup_key.into(),
            error: Some(error),
        }
    }

    /// Whether the operation completed without error.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Convert into a `Result`, dropping the backup key on failure.
    pub fn into_result(self) -> CellarResult<String> {
        match self.error {
            None => Ok(self.backup_key),
            Some(err) => Err(err),
        }
    }
}
