//! In-memory `DocumentStore` used by unit tests.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::db::models::{Document, DocumentId, DocumentPatch, NewDocument};
use crate::db::store::DocumentStore;
use crate::error::AppError;

/// Hand-rolled store double backed by a `Mutex<Vec<Document>>`.
///
/// Patch semantics go through `DocumentPatch::apply_to`, so behavior stays
/// aligned with the MongoDB translation.
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<Vec<Document>>,
    seq: AtomicI64,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully specified record, bypassing `insert` defaults.
    ///
    /// Used to set up states the public operations cannot produce, such as
    /// corrupted parent links.
    pub fn seed(&self, doc: Document) {
        self.seq.fetch_max(doc.created_seq, Ordering::SeqCst);
        self.documents.lock().unwrap().push(doc);
    }

    fn sorted_desc(mut docs: Vec<Document>) -> Vec<Document> {
        docs.sort_by(|a, b| b.created_seq.cmp(&a.created_seq));
        docs
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, id: &DocumentId) -> Result<Option<Document>, AppError> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| &d.id == id)
            .cloned())
    }

    async fn insert(&self, new: NewDocument) -> Result<Document, AppError> {
        let document = Document {
            id: DocumentId::generate(),
            owner_id: new.owner_id,
            title: new.title,
            parent_id: new.parent_id,
            is_archived: false,
            is_published: false,
            content: None,
            cover_image_url: None,
            icon: None,
            created_at: chrono::Utc::now(),
            created_seq: self.seq.fetch_add(1, Ordering::SeqCst) + 1,
        };

        self.documents.lock().unwrap().push(document.clone());
        Ok(document)
    }

    async fn patch(&self, id: &DocumentId, patch: DocumentPatch) -> Result<Document, AppError> {
        let mut docs = self.documents.lock().unwrap();
        let doc = docs
            .iter_mut()
            .find(|d| &d.id == id)
            .ok_or_else(|| AppError::NotFound("Document not found".into()))?;

        patch.apply_to(doc);
        Ok(doc.clone())
    }

    async fn delete(&self, id: &DocumentId) -> Result<Document, AppError> {
        let mut docs = self.documents.lock().unwrap();
        let position = docs
            .iter()
            .position(|d| &d.id == id)
            .ok_or_else(|| AppError::NotFound("Document not found".into()))?;

        Ok(docs.remove(position))
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        archived: Option<bool>,
    ) -> Result<Vec<Document>, AppError> {
        let docs = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.owner_id == owner_id)
            .filter(|d| archived.map_or(true, |flag| d.is_archived == flag))
            .cloned()
            .collect();

        Ok(Self::sorted_desc(docs))
    }

    async fn list_children(
        &self,
        owner_id: &str,
        parent_id: Option<&DocumentId>,
        archived: Option<bool>,
    ) -> Result<Vec<Document>, AppError> {
        let docs = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.owner_id == owner_id)
            .filter(|d| d.parent_id.as_ref() == parent_id)
            .filter(|d| archived.map_or(true, |flag| d.is_archived == flag))
            .cloned()
            .collect();

        Ok(Self::sorted_desc(docs))
    }
}
