//! Download sinks.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use cellar_core::error::{CellarError, CellarResult, ErrorCode};
use cellar_core::traits::DownloadSink;

/// Writes each download to `<dir>/<fileName>`, creating `dir` as needed.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Create a sink that writes into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn download(&self, file_name: &str, text: &str) -> CellarResult<()> {
        // File names must stay inside the sink directory.
        let plain = Path::new(file_name)
            .file_name()
            .map_or(false, |name| name == file_name);
        if !plain {
            return Err(CellarError::download(format!(
                "Invalid file name '{}': must not contain a path",
                file_name
            )));
        }

        let target = self.dir.join(file_name);
        let write = async {
            tokio::fs::create_dir_all(&self.dir).await?;
            tokio::fs::write(&target, text).await
        };
        write.await.map_err(|e| CellarError::Download {
            message: format!("Failed to write {}: {}", target.display(), e),
            code: ErrorCode::ExpDownloadFailed,
            source: Some(Box::new(e)),
        })?;
        tracing::info!("Wrote export {}", target.display());
        Ok(())
    }
}
