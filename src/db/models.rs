use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque unique identifier of a document.
///
/// Assigned once at creation (uuid v4) and stored as the `_id` of the
/// `documents` collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single note page stored in MongoDB.
///
/// Documents form a forest per owner: `parent_id`, when present, references
/// another document with the same `owner_id`. Archive state of a whole
/// subtree is kept consistent by cascading updates in the lifecycle service,
/// not by any storage constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    /// Subject identifier of the owning user. Immutable after creation.
    pub owner_id: String,
    /// Display title. Never empty; blank titles are stored as "Untitled".
    pub title: String,
    /// Optional parent document (same owner). `None` means top level.
    #[serde(default)]
    pub parent_id: Option<DocumentId>,
    /// True while the document sits in the trash.
    pub is_archived: bool,
    /// Gates unauthenticated read access.
    pub is_published: bool,
    /// Opaque editor body. Owned by the editor surface.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Monotonic creation sequence, the descending sort key for listings.
    pub created_seq: i64,
}

/// Fields supplied when inserting a new document.
///
/// Everything else (id, flags, timestamps) is filled in by the store.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub owner_id: String,
    pub title: String,
    pub parent_id: Option<DocumentId>,
}

/// Field-level patch applied atomically to a single document record.
///
/// `None` leaves a field untouched. For the clearable fields the outer
/// option marks presence and the inner option distinguishes set from clear,
/// mirroring `$set` vs `$unset`.
#[derive(Debug, Clone, Default)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub cover_image_url: Option<Option<String>>,
    pub icon: Option<Option<String>>,
    pub is_published: Option<bool>,
    pub is_archived: Option<bool>,
    pub parent_id: Option<Option<DocumentId>>,
}

impl DocumentPatch {
    /// Patch that only flips the archive flag, as used by cascades.
    pub fn archived(flag: bool) -> Self {
        Self {
            is_archived: Some(flag),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.cover_image_url.is_none()
            && self.icon.is_none()
            && self.is_published.is_none()
            && self.is_archived.is_none()
            && self.parent_id.is_none()
    }

    /// Apply this patch to an in-memory record.
    ///
    /// Shared by the in-memory store so patch semantics cannot drift from
    /// the MongoDB `$set`/`$unset` translation.
    pub fn apply_to(&self, doc: &mut Document) {
        if let Some(title) = &self.title {
            doc.title = title.clone();
        }
        if let Some(content) = &self.content {
            doc.content = Some(content.clone());
        }
        if let Some(cover) = &self.cover_image_url {
            doc.cover_image_url = cover.clone();
        }
        if let Some(icon) = &self.icon {
            doc.icon = icon.clone();
        }
        if let Some(published) = self.is_published {
            doc.is_published = published;
        }
        if let Some(archived) = self.is_archived {
            doc.is_archived = archived;
        }
        if let Some(parent) = &self.parent_id {
            doc.parent_id = parent.clone();
        }
    }
}
