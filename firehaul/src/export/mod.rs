//! Export orchestration.
//!
//! [`run_export`] drives a whole run: resolve the mode directory, list
//! the root collections, walk each one sequentially, then stamp the run
//! with its metadata descriptor. Subtree failures are recorded and
//! siblings continue; only credential/connection failures abort the run.

pub mod types;
pub mod walker;

pub use types::{
    CollectionFailure, CollectionReport, ConsoleProgress, ExportMetadata, ExportProgress,
    NoopProgress, RunReport, WalkReport,
};
pub use walker::walk_collection;

use chrono::{SecondsFormat, Utc};
use tracing::{error, info};

use crate::config::ExportConfig;
use crate::error::Result;
use crate::sink::ExportSink;
use crate::store::DocumentStore;

/// Name of the run descriptor file.
pub const METADATA_FILE: &str = "metadata.json";

static NOOP_PROGRESS: NoopProgress = NoopProgress;

const FILE_LAYOUT: &str = "one <collectionId>.json per collection; \
     sub-collections under <collectionId>/<documentId>/, recursively";

/// Run a full export: every root collection, then the run descriptor.
///
/// `metadata.json` is written only when every subtree completed; its
/// absence is the partial-run marker. Output already written stays on
/// disk either way, with no rollback.
pub async fn run_export(
    store: &dyn DocumentStore,
    sink: &dyn ExportSink,
    config: &ExportConfig,
    progress: Option<&dyn ExportProgress>,
) -> Result<RunReport> {
    let progress = progress.unwrap_or(&NOOP_PROGRESS);
    let out_dir = config.resolved_output();
    sink.ensure_dir(&out_dir).await?;

    let roots = store.list_collections(None).await?;
    info!(
        mode = %config.mode,
        collections = roots.len(),
        out = %out_dir.display(),
        "starting export"
    );

    let mut report = RunReport::default();
    for root in roots {
        match walker::walk_collection(store, sink, &root, &out_dir, config.mode, progress).await {
            Ok(walked) => {
                info!(collection = %root.id, documents = walked.documents, "collection exported");
                report.collections.push(CollectionReport {
                    collection: root.id,
                    documents: walked.documents,
                    files: walked.files,
                });
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                error!(collection = %root.id, error = %e, "collection subtree failed");
                progress.on_error(&e.to_string());
                report.failures.push(CollectionFailure {
                    collection: root.id,
                    error: e.to_string(),
                });
            }
        }
    }

    if report.success() {
        let metadata = ExportMetadata {
            exported_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            mode: config.mode,
            project_id: config.resolved_project_id(),
            file_layout: FILE_LAYOUT.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        };
        sink.write_file(
            &out_dir.join(METADATA_FILE),
            &serde_json::to_vec_pretty(&metadata)?,
        )
        .await?;
        report.metadata_written = true;
    }

    progress.on_complete(report.documents() as u64);
    Ok(report)
}
