//! In-memory store.
//!
//! Backs fixtures and offline smoke runs; the integration tests drive the
//! whole engine against it without a live endpoint.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::value::FieldMap;

use super::{CollectionRef, DocumentStore, SourceDocument};

/// A document held by a [`MemoryStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    pub id: String,
    pub fields: FieldMap,
    pub collections: Vec<MemoryCollection>,
}

impl MemoryDocument {
    pub fn new(id: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            id: id.into(),
            fields,
            collections: Vec::new(),
        }
    }

    pub fn with_collection(mut self, collection: MemoryCollection) -> Self {
        self.collections.push(collection);
        self
    }
}

/// A collection held by a [`MemoryStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryCollection {
    pub id: String,
    pub documents: Vec<MemoryDocument>,
}

impl MemoryCollection {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            documents: Vec::new(),
        }
    }

    pub fn with_document(mut self, document: MemoryDocument) -> Self {
        self.documents.push(document);
        self
    }
}

/// Nested in-memory document store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    roots: Vec<MemoryCollection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, collection: MemoryCollection) -> Self {
        self.roots.push(collection);
        self
    }

    /// Walk a slash-delimited collection path
    /// (`users`, `users/u1/orders`, …).
    fn collection(&self, path: &str) -> Option<&MemoryCollection> {
        let mut segments = path.split('/');
        let root_id = segments.next()?;
        let mut current = self.roots.iter().find(|c| c.id == root_id)?;
        loop {
            let Some(doc_id) = segments.next() else {
                return Some(current);
            };
            let document = current.documents.iter().find(|d| d.id == doc_id)?;
            let collection_id = segments.next()?;
            current = document
                .collections
                .iter()
                .find(|c| c.id == collection_id)?;
        }
    }

    fn document(&self, path: &str) -> Option<&MemoryDocument> {
        let (collection_path, doc_id) = path.rsplit_once('/')?;
        self.collection(collection_path)?
            .documents
            .iter()
            .find(|d| d.id == doc_id)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_collections(&self, parent: Option<&str>) -> Result<Vec<CollectionRef>> {
        match parent {
            None => Ok(self
                .roots
                .iter()
                .map(|c| CollectionRef::root(c.id.clone()))
                .collect()),
            Some(doc_path) => {
                let document = self.document(doc_path).ok_or_else(|| Error::Fetch {
                    collection: doc_path.to_string(),
                    reason: "no such document".to_string(),
                })?;
                Ok(document
                    .collections
                    .iter()
                    .map(|c| CollectionRef::nested(doc_path, c.id.clone()))
                    .collect())
            }
        }
    }

    async fn fetch_documents(&self, collection: &CollectionRef) -> Result<Vec<SourceDocument>> {
        let found = self.collection(&collection.path).ok_or_else(|| Error::Fetch {
            collection: collection.path.clone(),
            reason: "no such collection".to_string(),
        })?;
        Ok(found
            .documents
            .iter()
            .map(|d| SourceDocument {
                id: d.id.clone(),
                fields: d.fields.clone(),
            })
            .collect())
    }
}
