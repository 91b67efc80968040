use async_trait::async_trait;

use crate::db::models::{Document, DocumentId, DocumentPatch, NewDocument};
use crate::error::AppError;

/// Store trait for document records.
///
/// Models the capabilities the lifecycle service needs from the database:
/// point lookups, insert, single-record atomic patch/delete, and equality
/// scans over the two indexed shapes (owner, owner+parent) in descending
/// creation order. The trait also allows swapping the database out in tests.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point lookup by id.
    async fn get(&self, id: &DocumentId) -> Result<Option<Document>, AppError>;

    /// Insert a new record and return it, id and timestamps assigned.
    async fn insert(&self, new: NewDocument) -> Result<Document, AppError>;

    /// Atomically patch one record and return the updated state.
    ///
    /// Fails with `NotFound` if the id does not resolve. An empty patch
    /// returns the record unchanged.
    async fn patch(&self, id: &DocumentId, patch: DocumentPatch) -> Result<Document, AppError>;

    /// Permanently remove one record and return it.
    ///
    /// Fails with `NotFound` if the id does not resolve.
    async fn delete(&self, id: &DocumentId) -> Result<Document, AppError>;

    /// All documents of one owner, newest first.
    ///
    /// `archived` filters on the archive flag; `None` scans both states.
    async fn list_by_owner(
        &self,
        owner_id: &str,
        archived: Option<bool>,
    ) -> Result<Vec<Document>, AppError>;

    /// Direct children of `parent_id` (top level when `None`) for one
    /// owner, newest first. `archived` filters as in `list_by_owner`.
    async fn list_children(
        &self,
        owner_id: &str,
        parent_id: Option<&DocumentId>,
        archived: Option<bool>,
    ) -> Result<Vec<Document>, AppError>;
}

/// MongoDB implementation of the DocumentStore.
pub struct MongoDocumentStore {
    collection: mongodb::Collection<Document>,
}

impl MongoDocumentStore {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("documents"),
        }
    }

    /// Create the two scan indexes. Idempotent; called once at startup.
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        use mongodb::bson::doc;
        use mongodb::IndexModel;

        let by_owner = IndexModel::builder()
            .keys(doc! { "owner_id": 1 })
            .build();
        let by_owner_parent = IndexModel::builder()
            .keys(doc! { "owner_id": 1, "parent_id": 1 })
            .build();

        self.collection
            .create_index(by_owner)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        self.collection
            .create_index(by_owner_parent)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    /// Translate a `DocumentPatch` into a `$set`/`$unset` update document.
    fn patch_to_update(patch: &DocumentPatch) -> mongodb::bson::Document {
        use mongodb::bson::Document as BsonDocument;

        let mut set = BsonDocument::new();
        let mut unset = BsonDocument::new();

        if let Some(title) = &patch.title {
            set.insert("title", title);
        }
        if let Some(content) = &patch.content {
            set.insert("content", content);
        }
        match &patch.cover_image_url {
            Some(Some(url)) => {
                set.insert("cover_image_url", url);
            }
            Some(None) => {
                unset.insert("cover_image_url", "");
            }
            None => {}
        }
        match &patch.icon {
            Some(Some(icon)) => {
                set.insert("icon", icon);
            }
            Some(None) => {
                unset.insert("icon", "");
            }
            None => {}
        }
        if let Some(published) = patch.is_published {
            set.insert("is_published", published);
        }
        if let Some(archived) = patch.is_archived {
            set.insert("is_archived", archived);
        }
        match &patch.parent_id {
            Some(Some(parent)) => {
                set.insert("parent_id", parent.as_str());
            }
            Some(None) => {
                unset.insert("parent_id", "");
            }
            None => {}
        }

        let mut update = BsonDocument::new();
        if !set.is_empty() {
            update.insert("$set", set);
        }
        if !unset.is_empty() {
            update.insert("$unset", unset);
        }
        update
    }

    async fn scan(
        &self,
        filter: mongodb::bson::Document,
    ) -> Result<Vec<Document>, AppError> {
        use mongodb::bson::doc;
        use mongodb::options::FindOptions;

        let options = FindOptions::builder()
            .sort(doc! { "created_seq": -1 })
            .build();

        let mut cursor = self
            .collection
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut documents = Vec::new();
        use futures::TryStreamExt;
        while let Some(doc) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            documents.push(doc);
        }

        Ok(documents)
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn get(&self, id: &DocumentId) -> Result<Option<Document>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "_id": id.as_str() })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert(&self, new: NewDocument) -> Result<Document, AppError> {
        let now = chrono::Utc::now();
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
            created_at: now,
            created_seq: now.timestamp_micros(),
        };

        self.collection
            .insert_one(&document)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(document)
    }

    async fn patch(&self, id: &DocumentId, patch: DocumentPatch) -> Result<Document, AppError> {
        use mongodb::bson::doc;
        use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

        if patch.is_empty() {
            return self
                .get(id)
                .await?
                .ok_or_else(|| AppError::NotFound("Document not found".into()));
        }

        let update = Self::patch_to_update(&patch);
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.collection
            .find_one_and_update(doc! { "_id": id.as_str() }, update)
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound("Document not found".into()))
    }

    async fn delete(&self, id: &DocumentId) -> Result<Document, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one_and_delete(doc! { "_id": id.as_str() })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound("Document not found".into()))
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        archived: Option<bool>,
    ) -> Result<Vec<Document>, AppError> {
        use mongodb::bson::doc;

        let mut filter = doc! { "owner_id": owner_id };
        if let Some(archived) = archived {
            filter.insert("is_archived", archived);
        }

        self.scan(filter).await
    }

    async fn list_children(
        &self,
        owner_id: &str,
        parent_id: Option<&DocumentId>,
        archived: Option<bool>,
    ) -> Result<Vec<Document>, AppError> {
        use mongodb::bson::{doc, Bson};

        let parent = match parent_id {
            Some(id) => Bson::String(id.as_str().to_string()),
            // Matches both explicit null and absent parent fields.
            None => Bson::Null,
        };

        let mut filter = doc! { "owner_id": owner_id, "parent_id": parent };
        if let Some(archived) = archived {
            filter.insert("is_archived", archived);
        }

        self.scan(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_to_update_set_and_unset() {
        let patch = DocumentPatch {
            title: Some("Renamed".to_string()),
            icon: Some(None),
            is_published: Some(true),
            ..Default::default()
        };

        let update = MongoDocumentStore::patch_to_update(&patch);
        let set = update.get_document("$set").unwrap();
        let unset = update.get_document("$unset").unwrap();

        assert_eq!(set.get_str("title").unwrap(), "Renamed");
        assert!(set.get_bool("is_published").unwrap());
        assert!(unset.contains_key("icon"));
        assert!(!set.contains_key("icon"));
    }

    #[test]
    fn test_patch_to_update_reparent_clears_parent() {
        let patch = DocumentPatch {
            is_archived: Some(false),
            parent_id: Some(None),
            ..Default::default()
        };

        let update = MongoDocumentStore::patch_to_update(&patch);
        let set = update.get_document("$set").unwrap();
        let unset = update.get_document("$unset").unwrap();

        assert!(!set.get_bool("is_archived").unwrap());
        assert!(unset.contains_key("parent_id"));
    }

    #[test]
    fn test_patch_to_update_set_parent() {
        let patch = DocumentPatch {
            parent_id: Some(Some(DocumentId("parent-9".to_string()))),
            ..Default::default()
        };

        let update = MongoDocumentStore::patch_to_update(&patch);
        let set = update.get_document("$set").unwrap();

        assert_eq!(set.get_str("parent_id").unwrap(), "parent-9");
        assert!(!update.contains_key("$unset"));
    }
}
