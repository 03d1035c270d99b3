//! Recursive collection walker.
//!
//! One frame per collection: fetch the documents, serialize them in
//! fetch order, descend into every document's sub-collections, then
//! write this collection's file. Nesting depth is unbounded and mirrors
//! store depth exactly; frames are boxed futures, so depth costs heap,
//! not call stack.

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::ExportMode;
use crate::error::Result;
use crate::sink::ExportSink;
use crate::store::{CollectionRef, DocumentStore};
use crate::value::serialize;

use super::types::{ExportProgress, WalkReport};

/// Key under which the document identifier lands in the output object.
/// A source field of the same name keeps its position but loses its
/// value to the identifier (last write wins).
const ID_KEY: &str = "id";

/// Export one collection subtree under `out_dir`.
///
/// Any fetch or write failure aborts this subtree only; the caller
/// decides what happens to siblings.
pub async fn walk_collection(
    store: &dyn DocumentStore,
    sink: &dyn ExportSink,
    collection: &CollectionRef,
    out_dir: &Path,
    mode: ExportMode,
    progress: &dyn ExportProgress,
) -> Result<WalkReport> {
    walk_inner(
        store,
        sink,
        collection.clone(),
        out_dir.to_path_buf(),
        mode,
        progress,
    )
    .await
}

fn walk_inner<'a>(
    store: &'a dyn DocumentStore,
    sink: &'a dyn ExportSink,
    collection: CollectionRef,
    out_dir: PathBuf,
    mode: ExportMode,
    progress: &'a dyn ExportProgress,
) -> BoxFuture<'a, Result<WalkReport>> {
    async move {
        sink.ensure_dir(&out_dir).await?;

        let documents = store.fetch_documents(&collection).await?;
        debug!(collection = %collection.path, count = documents.len(), "walking collection");

        // Pass one: serialize every document, in fetch order.
        let mut serialized = Vec::with_capacity(documents.len());
        for document in &documents {
            let mut object = JsonMap::with_capacity(document.fields.len() + 1);
            for (name, value) in &document.fields {
                object.insert(name.clone(), serialize(value, mode));
            }
            object.insert(ID_KEY.to_string(), JsonValue::String(document.id.clone()));
            serialized.push(JsonValue::Object(object));
        }

        // Pass two: descend into each document's sub-collections, in
        // listing order, before this collection's file is written.
        let mut report = WalkReport::default();
        for document in &documents {
            let doc_path = collection.document_path(&document.id);
            let children = store.list_collections(Some(&doc_path)).await?;
            if children.is_empty() {
                continue;
            }
            let child_dir = out_dir.join(&collection.id).join(&document.id);
            for child in children {
                let child_report =
                    walk_inner(store, sink, child, child_dir.clone(), mode, progress).await?;
                report.absorb(child_report);
            }
        }

        let file = out_dir.join(format!("{}.json", collection.id));
        let body = serde_json::to_vec_pretty(&JsonValue::Array(serialized))?;
        sink.write_file(&file, &body).await?;

        report.documents += documents.len();
        report.files.push(file);
        progress.on_progress(documents.len() as u64, &collection.path);
        Ok(report)
    }
    .boxed()
}
