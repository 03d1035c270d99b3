//! Export run types and metadata.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::ExportMode;

/// Run-completion descriptor, written as `metadata.json` once every
/// collection subtree finished cleanly. Its absence marks a failed or
/// partial run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    /// Run timestamp (RFC 3339).
    pub exported_at: String,
    /// Serialization mode of the tree this descriptor sits in.
    pub mode: ExportMode,
    /// Store/project identifier.
    pub project_id: String,
    /// Human description of the directory layout.
    pub file_layout: String,
    /// Version of the exporting tool.
    pub tool_version: String,
}

/// Per-collection outcome of a completed subtree.
#[derive(Debug, Clone)]
pub struct CollectionReport {
    /// Root collection id.
    pub collection: String,
    /// Documents written, nested sub-collections included.
    pub documents: usize,
    /// Files the subtree created.
    pub files: Vec<PathBuf>,
}

/// A subtree that failed and was skipped past.
#[derive(Debug, Clone)]
pub struct CollectionFailure {
    pub collection: String,
    pub error: String,
}

/// Outcome of one export run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub collections: Vec<CollectionReport>,
    pub failures: Vec<CollectionFailure>,
    /// Whether the run descriptor was written.
    pub metadata_written: bool,
}

impl RunReport {
    /// True when every collection subtree completed.
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total documents written across all completed subtrees.
    pub fn documents(&self) -> usize {
        self.collections.iter().map(|c| c.documents).sum()
    }
}

/// Walk outcome for one collection subtree.
#[derive(Debug, Default)]
pub struct WalkReport {
    /// Documents serialized and written.
    pub documents: usize,
    /// Files created, in write order (diagnostics).
    pub files: Vec<PathBuf>,
}

impl WalkReport {
    pub(crate) fn absorb(&mut self, child: WalkReport) {
        self.documents += child.documents;
        self.files.extend(child.files);
    }
}

/// Progress callback for long-running exports.
pub trait ExportProgress: Send + Sync {
    /// Called after each collection file is written.
    fn on_progress(&self, documents: u64, collection: &str);

    /// Called when the run completes.
    fn on_complete(&self, total: u64);

    /// Called when a subtree fails.
    fn on_error(&self, error: &str);
}

/// No-op progress reporter for when progress isn't needed.
pub struct NoopProgress;

impl ExportProgress for NoopProgress {
    fn on_progress(&self, _documents: u64, _collection: &str) {}
    fn on_complete(&self, _total: u64) {}
    fn on_error(&self, _error: &str) {}
}

/// Simple console progress reporter.
pub struct ConsoleProgress {
    prefix: String,
}

impl ConsoleProgress {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl ExportProgress for ConsoleProgress {
    fn on_progress(&self, documents: u64, collection: &str) {
        eprint!("\r{} {} ({} docs)", self.prefix, collection, documents);
    }

    fn on_complete(&self, total: u64) {
        eprintln!("\r{} Complete. {} documents exported.", self.prefix, total);
    }

    fn on_error(&self, error: &str) {
        eprintln!("\r{} Error: {}", self.prefix, error);
    }
}
