//! End-to-end tests for the export engine over an in-memory store.
//!
//! Verifies:
//! - the exact file/directory layout, including unbounded nesting
//! - both serialization modes and their exclusivity guarantees
//! - byte-identical output across repeated runs
//! - failure isolation between root collections and metadata gating

use async_trait::async_trait;
use firehaul::export::{run_export, METADATA_FILE};
use firehaul::sink::LocalSink;
use firehaul::store::{
    CollectionRef, DocumentStore, MemoryCollection, MemoryDocument, MemoryStore, SourceDocument,
};
use firehaul::value::{FieldMap, FieldValue, GeoPoint, Timestamp};
use firehaul::{Error, ExportConfig, ExportMode, RunReport};
use serde_json::{json, Value as JsonValue};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// 2024-01-01T00:00:00Z
const NEW_YEAR_2024: i64 = 1_704_067_200;

fn fields(pairs: Vec<(&str, FieldValue)>) -> FieldMap {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// `users` with one document, no sub-collections.
fn users_store() -> MemoryStore {
    MemoryStore::new().with_collection(
        MemoryCollection::new("users").with_document(MemoryDocument::new(
            "u1",
            fields(vec![
                ("name", "Ann".into()),
                ("joined", Timestamp::new(NEW_YEAR_2024, 0).into()),
            ]),
        )),
    )
}

/// `users` with one document holding an `orders` sub-collection.
fn nested_store() -> MemoryStore {
    MemoryStore::new().with_collection(
        MemoryCollection::new("users").with_document(
            MemoryDocument::new("u1", fields(vec![("name", "Ann".into())])).with_collection(
                MemoryCollection::new("orders").with_document(MemoryDocument::new(
                    "o1",
                    fields(vec![("total", 99i64.into())]),
                )),
            ),
        ),
    )
}

async fn export(store: &dyn DocumentStore, mode: ExportMode, root: &Path) -> RunReport {
    let config = ExportConfig::new(mode, root).with_project_id("demo-project");
    run_export(store, &LocalSink, &config, None)
        .await
        .expect("run should not abort")
}

fn read_json(path: &Path) -> JsonValue {
    let raw = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    serde_json::from_str(&raw).unwrap()
}

/// Every `.json` file under `dir`, recursively.
fn json_files(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in std::fs::read_dir(&current).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "json") {
                found.push(path);
            }
        }
    }
    found
}

// =========================================================================
// Layout and scenarios
// =========================================================================

#[tokio::test]
async fn readable_export_matches_expected_bytes() {
    let temp = TempDir::new().unwrap();
    let report = export(&users_store(), ExportMode::Readable, temp.path()).await;

    assert!(report.success());
    assert_eq!(report.documents(), 1);

    let written = std::fs::read_to_string(temp.path().join("readable/users.json")).unwrap();
    let expected = serde_json::to_string_pretty(&json!([
        {
            "name": "Ann",
            "joined": "2024-01-01T00:00:00.000Z",
            "id": "u1"
        }
    ]))
    .unwrap();
    assert_eq!(written, expected);
}

#[tokio::test]
async fn typed_export_tags_timestamps() {
    let temp = TempDir::new().unwrap();
    export(&users_store(), ExportMode::Typed, temp.path()).await;

    let documents = read_json(&temp.path().join("typed/users.json"));
    assert_eq!(
        documents[0]["joined"],
        json!({"__type": "timestamp", "value": "2024-01-01T00:00:00.000Z"})
    );
    assert_eq!(documents[0]["id"], json!("u1"));
}

#[tokio::test]
async fn sub_collections_nest_alongside_the_parent_file() {
    let temp = TempDir::new().unwrap();
    let report = export(&nested_store(), ExportMode::Readable, temp.path()).await;

    assert_eq!(report.documents(), 2);
    assert!(temp.path().join("readable/users.json").is_file());

    let orders = read_json(&temp.path().join("readable/users/u1/orders.json"));
    assert_eq!(orders, json!([{"total": 99, "id": "o1"}]));
}

#[tokio::test]
async fn nesting_depth_mirrors_store_depth() {
    // a/d1 -> b/d2 -> c: three collection levels, three directory levels.
    let store = MemoryStore::new().with_collection(
        MemoryCollection::new("a").with_document(
            MemoryDocument::new("d1", fields(vec![("level", 1i64.into())])).with_collection(
                MemoryCollection::new("b").with_document(
                    MemoryDocument::new("d2", fields(vec![("level", 2i64.into())]))
                        .with_collection(MemoryCollection::new("c").with_document(
                            MemoryDocument::new("d3", fields(vec![("level", 3i64.into())])),
                        )),
                ),
            ),
        ),
    );

    let temp = TempDir::new().unwrap();
    let report = export(&store, ExportMode::Readable, temp.path()).await;

    assert_eq!(report.documents(), 3);
    let base = temp.path().join("readable");
    assert!(base.join("a.json").is_file());
    assert!(base.join("a/d1/b.json").is_file());
    assert!(base.join("a/d1/b/d2/c.json").is_file());
}

#[tokio::test]
async fn both_modes_coexist_under_one_root() {
    let temp = TempDir::new().unwrap();
    let store = users_store();
    export(&store, ExportMode::Readable, temp.path()).await;
    export(&store, ExportMode::Typed, temp.path()).await;

    assert!(temp.path().join("readable/users.json").is_file());
    assert!(temp.path().join("typed/users.json").is_file());
}

#[tokio::test]
async fn document_id_overwrites_a_source_id_field_in_place() {
    let store = MemoryStore::new().with_collection(
        MemoryCollection::new("users").with_document(MemoryDocument::new(
            "u9",
            fields(vec![("id", "spoofed".into()), ("name", "Bob".into())]),
        )),
    );

    let temp = TempDir::new().unwrap();
    export(&store, ExportMode::Readable, temp.path()).await;

    let raw = std::fs::read_to_string(temp.path().join("readable/users.json")).unwrap();
    let documents = read_json(&temp.path().join("readable/users.json"));
    assert_eq!(documents[0]["id"], json!("u9"));
    // The spoofed value is gone entirely, and the key kept its slot.
    assert!(!raw.contains("spoofed"));
    let expected =
        serde_json::to_string_pretty(&json!([{"id": "u9", "name": "Bob"}])).unwrap();
    assert_eq!(raw, expected);
}

// =========================================================================
// Idempotence
// =========================================================================

#[tokio::test]
async fn repeated_runs_produce_identical_collection_files() {
    let temp = TempDir::new().unwrap();
    let store = nested_store();

    export(&store, ExportMode::Typed, temp.path()).await;
    let first = std::fs::read(temp.path().join("typed/users.json")).unwrap();
    let first_orders = std::fs::read(temp.path().join("typed/users/u1/orders.json")).unwrap();

    export(&store, ExportMode::Typed, temp.path()).await;
    let second = std::fs::read(temp.path().join("typed/users.json")).unwrap();
    let second_orders = std::fs::read(temp.path().join("typed/users/u1/orders.json")).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_orders, second_orders);
}

// =========================================================================
// Mode exclusivity
// =========================================================================

fn exotic_store() -> MemoryStore {
    MemoryStore::new().with_collection(
        MemoryCollection::new("places").with_document(MemoryDocument::new(
            "p1",
            fields(vec![
                ("where", GeoPoint::new(48.85, 2.35).into()),
                ("owner", FieldValue::Reference("users/u1".into())),
                ("thumb", FieldValue::Bytes(vec![1, 2, 3])),
                ("seen", Timestamp::new(NEW_YEAR_2024, 0).into()),
            ]),
        )),
    )
}

#[tokio::test]
async fn readable_trees_never_carry_type_markers() {
    let temp = TempDir::new().unwrap();
    export(&exotic_store(), ExportMode::Readable, temp.path()).await;

    for file in json_files(&temp.path().join("readable")) {
        let raw = std::fs::read_to_string(&file).unwrap();
        assert!(
            !raw.contains("__type"),
            "readable file {} contains a type marker",
            file.display()
        );
    }
}

#[tokio::test]
async fn typed_trees_never_carry_bare_references() {
    let temp = TempDir::new().unwrap();
    export(&exotic_store(), ExportMode::Typed, temp.path()).await;

    let documents = read_json(&temp.path().join("typed/places.json"));
    assert_eq!(
        documents[0]["owner"],
        json!({"__type": "ref", "path": "users/u1"})
    );
    assert_eq!(
        documents[0]["where"],
        json!({"__type": "geopoint", "lat": 48.85, "lng": 2.35})
    );
}

// =========================================================================
// Failure isolation and metadata gating
// =========================================================================

/// Delegates to a [`MemoryStore`] but refuses to fetch one collection.
struct FailingStore {
    inner: MemoryStore,
    poisoned: String,
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn list_collections(&self, parent: Option<&str>) -> firehaul::Result<Vec<CollectionRef>> {
        self.inner.list_collections(parent).await
    }

    async fn fetch_documents(
        &self,
        collection: &CollectionRef,
    ) -> firehaul::Result<Vec<SourceDocument>> {
        if collection.path == self.poisoned {
            return Err(Error::Fetch {
                collection: collection.path.clone(),
                reason: "injected failure".to_string(),
            });
        }
        self.inner.fetch_documents(collection).await
    }
}

#[tokio::test]
async fn a_failing_subtree_does_not_block_its_siblings() {
    let inner = MemoryStore::new()
        .with_collection(
            MemoryCollection::new("broken")
                .with_document(MemoryDocument::new("x", fields(vec![]))),
        )
        .with_collection(MemoryCollection::new("healthy").with_document(MemoryDocument::new(
            "h1",
            fields(vec![("ok", true.into())]),
        )));
    let store = FailingStore {
        inner,
        poisoned: "broken".to_string(),
    };

    let temp = TempDir::new().unwrap();
    let report = export(&store, ExportMode::Readable, temp.path()).await;

    assert!(!report.success());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].collection, "broken");

    // The sibling exported fully; the run descriptor was withheld.
    let healthy = read_json(&temp.path().join("readable/healthy.json"));
    assert_eq!(healthy, json!([{"ok": true, "id": "h1"}]));
    assert!(!temp.path().join("readable/broken.json").exists());
    assert!(!temp.path().join("readable").join(METADATA_FILE).exists());
    assert!(!report.metadata_written);
}

#[tokio::test]
async fn successful_runs_write_the_descriptor_last() {
    let temp = TempDir::new().unwrap();
    let report = export(&users_store(), ExportMode::Typed, temp.path()).await;

    assert!(report.metadata_written);
    let metadata = read_json(&temp.path().join("typed").join(METADATA_FILE));
    assert_eq!(metadata["mode"], json!("typed"));
    assert_eq!(metadata["projectId"], json!("demo-project"));
    assert_eq!(metadata["toolVersion"], json!(env!("CARGO_PKG_VERSION")));
    assert!(metadata["fileLayout"].as_str().unwrap().contains("collectionId"));
    // exportedAt must be a parseable RFC 3339 instant.
    let exported_at = metadata["exportedAt"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(exported_at).is_ok());
}

#[tokio::test]
async fn empty_collections_still_produce_a_file() {
    let store =
        MemoryStore::new().with_collection(MemoryCollection::new("drafts"));
    let temp = TempDir::new().unwrap();
    let report = export(&store, ExportMode::Readable, temp.path()).await;

    assert!(report.success());
    assert_eq!(report.documents(), 0);
    let drafts = read_json(&temp.path().join("readable/drafts.json"));
    assert_eq!(drafts, json!([]));
}
