//! Snapshot type stored in the backup namespace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A content-addressed copy of the whole live record set.
///
/// `key` is the content hash of `json`, so two snapshots of byte-identical
/// content share a key and the later one replaces the earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupData {
    /// Content hash of `json`.
    pub key: String,
    /// Instant the snapshot was taken (ISO 8601).
    pub stored_at: String,
    /// The exported JSON array of records.
    pub json: String,
}

impl BackupData {
    /// Create a new snapshot.
    pub fn new(
        key: impl Into<String>,
        stored_at: impl Into<String>,
        json: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            stored_at: stored_at.into(),
            json: json.into(),
        }
    }

    /// Parse `stored_at` as an instant.
    pub fn stored_instant(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.stored_at)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }
}

/// Pick the most recently stored snapshot.
///
/// Snapshots whose timestamp does not parse rank below every parseable
/// one. Among equal instants the snapshot delivered first wins.
pub fn latest_backup(backups: &[BackupData]) -> Option<&BackupData> {
    let mut ranked: Vec<(Option<DateTime<Utc>>, &BackupData)> = backups
        .iter()
        .map(|b| {
            let instant = b.stored_instant();
            if instant.is_none() {
                tracing::warn!("Snapshot '{}' has unparseable storedAt '{}'", b.key, b.stored_at);
            }
            (instant, b)
        })
        .collect();

    // Stable sort, newest first; `None` orders below any `Some`.
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked.first().map(|(_, b)| *b)
}
