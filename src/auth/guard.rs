//! Per-operation authorization checks.
//!
//! Every mutation and every listing requires the caller to own the target;
//! the published-read path in the lifecycle service is the single relaxed
//! exception.

use crate::auth::models::Identity;
use crate::db::models::{Document, DocumentId};
use crate::db::store::DocumentStore;
use crate::error::AppError;

/// Resolve `id` and verify the caller owns it.
///
/// Returns the document so callers don't fetch twice. Fails with `NotFound`
/// when the id does not resolve and `Unauthorized` when it belongs to a
/// different subject.
pub async fn authorize_owner(
    store: &dyn DocumentStore,
    id: &DocumentId,
    identity: &Identity,
) -> Result<Document, AppError> {
    let document = store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".into()))?;

    if document.owner_id != identity.subject {
        return Err(AppError::Unauthorized(
            "Document belongs to another user".into(),
        ));
    }

    Ok(document)
}
