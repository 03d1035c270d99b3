//! Filesystem collaborator.
//!
//! The engine touches the filesystem through two operations only:
//! idempotent directory creation and whole-file writes with overwrite
//! semantics.

use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

use crate::error::Result;

/// Where exported files land.
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Create `path` and any missing parents. No error if already present.
    async fn ensure_dir(&self, path: &Path) -> Result<()>;

    /// Write `data` to `path`, replacing any existing file.
    async fn write_file(&self, path: &Path, data: &[u8]) -> Result<()>;
}

/// Local filesystem sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSink;

#[async_trait]
impl ExportSink for LocalSink {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).await?;
        Ok(())
    }

    #[instrument(skip(self, data), fields(path = %path.display(), size = data.len()))]
    async fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        debug!("writing file");
        fs::write(path, data).await?;
        Ok(())
    }
}
