use std::sync::Arc;

use serde::Deserialize;

use crate::auth::guard::authorize_owner;
use crate::auth::models::Identity;
use crate::db::models::{Document, DocumentId, DocumentPatch, NewDocument};
use crate::db::store::DocumentStore;
use crate::documents::cascade::{self, CascadeHandle};
use crate::error::AppError;

/// Title stored when a caller clears or omits one.
const UNTITLED: &str = "Untitled";

/// Caller-supplied fields for a partial document update.
///
/// Omitted fields are left untouched. Archive state and parentage are not
/// reachable through update; they move only through the dedicated
/// archive/restore transitions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDocument {
    pub title: Option<String>,
    pub content: Option<String>,
    pub cover_image_url: Option<String>,
    pub icon: Option<String>,
    pub is_published: Option<bool>,
}

/// The document hierarchy lifecycle service.
///
/// Owns every create/mutate/delete of document records and the archive and
/// restore transitions across subtrees. Authorization is checked here, per
/// operation, before any store write.
#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
}

impl DocumentService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a document owned by the caller, optionally under a parent.
    ///
    /// The parent, when given, must resolve and belong to the caller.
    pub async fn create(
        &self,
        identity: &Identity,
        title: String,
        parent_id: Option<DocumentId>,
    ) -> Result<Document, AppError> {
        if let Some(parent_id) = &parent_id {
            let parent = self
                .store
                .get(parent_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Parent document not found".into()))?;
            if parent.owner_id != identity.subject {
                return Err(AppError::Unauthorized(
                    "Parent document belongs to another user".into(),
                ));
            }
        }

        let document = self
            .store
            .insert(NewDocument {
                owner_id: identity.subject.clone(),
                title: normalize_title(title),
                parent_id,
            })
            .await?;

        tracing::info!(document = %document.id, "created document");
        Ok(document)
    }

    /// Apply a field-level update. Only supplied fields change.
    pub async fn update(
        &self,
        identity: &Identity,
        id: &DocumentId,
        update: UpdateDocument,
    ) -> Result<Document, AppError> {
        authorize_owner(self.store.as_ref(), id, identity).await?;

        let patch = DocumentPatch {
            title: update.title.map(normalize_title),
            content: update.content,
            cover_image_url: update.cover_image_url.map(Some),
            icon: update.icon.map(Some),
            is_published: update.is_published,
            ..Default::default()
        };

        self.store.patch(id, patch).await
    }

    /// Clear the icon, leaving every other field untouched.
    pub async fn remove_icon(
        &self,
        identity: &Identity,
        id: &DocumentId,
    ) -> Result<Document, AppError> {
        authorize_owner(self.store.as_ref(), id, identity).await?;
        self.store
            .patch(
                id,
                DocumentPatch {
                    icon: Some(None),
                    ..Default::default()
                },
            )
            .await
    }

    /// Clear the cover image, leaving every other field untouched.
    pub async fn remove_cover_image(
        &self,
        identity: &Identity,
        id: &DocumentId,
    ) -> Result<Document, AppError> {
        authorize_owner(self.store.as_ref(), id, identity).await?;
        self.store
            .patch(
                id,
                DocumentPatch {
                    cover_image_url: Some(None),
                    ..Default::default()
                },
            )
            .await
    }

    /// Move a document and its subtree to the trash.
    ///
    /// The returned record reflects the root only; descendants are archived
    /// by the background cascade behind the returned handle.
    pub async fn archive(
        &self,
        identity: &Identity,
        id: &DocumentId,
    ) -> Result<(Document, CascadeHandle), AppError> {
        authorize_owner(self.store.as_ref(), id, identity).await?;

        let document = self.store.patch(id, DocumentPatch::archived(true)).await?;
        tracing::info!(document = %document.id, "archived document, cascading to subtree");

        let handle = cascade::dispatch(
            Arc::clone(&self.store),
            identity.subject.clone(),
            id.clone(),
            true,
        );
        Ok((document, handle))
    }

    /// Bring a document and its subtree back from the trash.
    ///
    /// When the current parent is itself still archived the restored
    /// document is reparented to top level, so it never reappears under a
    /// trashed ancestor.
    pub async fn restore(
        &self,
        identity: &Identity,
        id: &DocumentId,
    ) -> Result<(Document, CascadeHandle), AppError> {
        let existing = authorize_owner(self.store.as_ref(), id, identity).await?;

        let mut patch = DocumentPatch::archived(false);
        if let Some(parent_id) = &existing.parent_id {
            if let Some(parent) = self.store.get(parent_id).await? {
                if parent.is_archived {
                    patch.parent_id = Some(None);
                }
            }
        }

        let document = self.store.patch(id, patch).await?;
        tracing::info!(document = %document.id, "restored document, cascading to subtree");

        let handle = cascade::dispatch(
            Arc::clone(&self.store),
            identity.subject.clone(),
            id.clone(),
            false,
        );
        Ok((document, handle))
    }

    /// Permanently delete a single record. Descendants are not touched.
    pub async fn remove(
        &self,
        identity: &Identity,
        id: &DocumentId,
    ) -> Result<Document, AppError> {
        authorize_owner(self.store.as_ref(), id, identity).await?;

        let document = self.store.delete(id).await?;
        tracing::info!(document = %document.id, "permanently deleted document");
        Ok(document)
    }

    /// Fetch one document.
    ///
    /// Published, non-archived documents are readable by anyone, including
    /// anonymous callers; everything else is owner-only. A missing id is
    /// `NotFound` regardless of who asks.
    pub async fn get_by_id(
        &self,
        identity: Option<&Identity>,
        id: &DocumentId,
    ) -> Result<Document, AppError> {
        let document = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Document not found".into()))?;

        if document.is_published && !document.is_archived {
            return Ok(document);
        }

        let identity = identity.ok_or(AppError::Unauthenticated)?;
        if document.owner_id != identity.subject {
            return Err(AppError::Unauthorized(
                "Document belongs to another user".into(),
            ));
        }

        Ok(document)
    }

    /// Non-archived children of `parent_id` (top level when `None`),
    /// newest first.
    pub async fn sidebar(
        &self,
        identity: &Identity,
        parent_id: Option<&DocumentId>,
    ) -> Result<Vec<Document>, AppError> {
        self.store
            .list_children(&identity.subject, parent_id, Some(false))
            .await
    }

    /// Everything the caller owns that sits in the trash, newest first.
    pub async fn trash(&self, identity: &Identity) -> Result<Vec<Document>, AppError> {
        self.store.list_by_owner(&identity.subject, Some(true)).await
    }

    /// Every non-archived document the caller owns, newest first.
    pub async fn search(&self, identity: &Identity) -> Result<Vec<Document>, AppError> {
        self.store
            .list_by_owner(&identity.subject, Some(false))
            .await
    }
}

/// Blank titles collapse to the placeholder.
fn normalize_title(title: String) -> String {
    if title.trim().is_empty() {
        UNTITLED.to_string()
    } else {
        title
    }
}
