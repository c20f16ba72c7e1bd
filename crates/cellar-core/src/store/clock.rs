//! Strictly increasing timestamps for one store instance.

use std::sync::Mutex;

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Wall clock that never repeats or goes backwards.
///
/// Timestamps are serialized with millisecond precision, so two calls in
/// the same millisecond would otherwise be indistinguishable when snapshots
/// are ordered by `storedAt`.
#[derive(Debug, Default)]
pub(crate) struct MonotonicClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Next instant, truncated to whole milliseconds.
    pub(crate) fn now(&self) -> DateTime<Utc> {
        let now = truncate_millis(Utc::now());
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let next = match *last {
            Some(prev) if now <= prev => prev + Duration::milliseconds(1),
            _ => now,
        };
        *last = Some(next);
        next
    }

    /// Next instant as ISO 8601, e.g. `2024-01-01T00:00:00.000Z`.
    pub(crate) fn timestamp(&self) -> String {
        self.now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

fn truncate_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or(dt)
}
