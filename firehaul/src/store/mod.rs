//! Store collaborator.
//!
//! The engine consumes the document store through exactly two
//! capabilities: list the collections under a document (or the root), and
//! fetch every document of a collection. Connections, credentials and
//! pagination live behind the implementations.

pub mod memory;
pub mod rest;

pub use memory::{MemoryCollection, MemoryDocument, MemoryStore};
pub use rest::{AuthMethod, RestStore};

use async_trait::async_trait;

use crate::error::Result;
use crate::value::FieldMap;

/// Handle to one collection in the store.
///
/// `path` locates the collection relative to the database root (`users`,
/// `users/u1/orders`); `id` is its final segment and names the output
/// file. Same-named collections under different documents are distinct
/// handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRef {
    pub id: String,
    pub path: String,
}

impl CollectionRef {
    /// Handle to a root collection.
    pub fn root(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            path: id.clone(),
            id,
        }
    }

    /// Handle to `collection_id` nested under the document at `doc_path`.
    pub fn nested(doc_path: &str, collection_id: impl Into<String>) -> Self {
        let id = collection_id.into();
        Self {
            path: format!("{doc_path}/{id}"),
            id,
        }
    }

    /// Path of a document inside this collection.
    pub fn document_path(&self, doc_id: &str) -> String {
        format!("{}/{}", self.path, doc_id)
    }
}

/// A document as fetched from the store: identifier plus ordered fields.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub id: String,
    pub fields: FieldMap,
}

/// Read access to a hierarchical document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List the collections directly under the document at `parent`, or
    /// the root collections when `parent` is `None`. Listing order is
    /// preserved all the way into the output tree.
    async fn list_collections(&self, parent: Option<&str>) -> Result<Vec<CollectionRef>>;

    /// Fetch every document of `collection`, in store order. Pagination
    /// happens internally; callers observe one complete batch.
    async fn fetch_documents(&self, collection: &CollectionRef) -> Result<Vec<SourceDocument>>;
}
