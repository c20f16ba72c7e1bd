//! Download sink trait.

use async_trait::async_trait;

use crate::error::CellarResult;

/// Destination for exported JSON files.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Deliver `text` under `file_name`.
    async fn download(&self, file_name: &str, text: &str) -> CellarResult<()>;
}
