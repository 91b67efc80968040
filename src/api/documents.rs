//! HTTP handlers for the document operation surface.
//!
//! Handlers stay thin: identity extraction, parameter shaping, one call into
//! the lifecycle service. Archive/restore drop the cascade handle — the
//! response reflects the root record only, and descendants catch up in the
//! background.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::provider::{CallerIdentity, MaybeIdentity};
use crate::db::models::{Document, DocumentId};
use crate::documents::service::UpdateDocument;
use crate::error::AppError;

/// Body of `POST /api/v1/documents`.
#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    /// Blank or omitted titles are stored as "Untitled".
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub parent_id: Option<DocumentId>,
}

/// Query of `GET /api/v1/documents`.
#[derive(Debug, Default, Deserialize)]
pub struct SidebarQuery {
    #[serde(default)]
    pub parent_id: Option<DocumentId>,
}

/// `POST /api/v1/documents`
pub async fn create_handler(
    State(state): State<AppState>,
    CallerIdentity(identity): CallerIdentity,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<Json<Document>, AppError> {
    let document = state
        .documents
        .create(&identity, request.title, request.parent_id)
        .await?;
    Ok(Json(document))
}

/// `GET /api/v1/documents?parent_id=…`
pub async fn sidebar_handler(
    State(state): State<AppState>,
    CallerIdentity(identity): CallerIdentity,
    Query(query): Query<SidebarQuery>,
) -> Result<Json<Vec<Document>>, AppError> {
    let documents = state
        .documents
        .sidebar(&identity, query.parent_id.as_ref())
        .await?;
    Ok(Json(documents))
}

/// `GET /api/v1/documents/search`
pub async fn search_handler(
    State(state): State<AppState>,
    CallerIdentity(identity): CallerIdentity,
) -> Result<Json<Vec<Document>>, AppError> {
    let documents = state.documents.search(&identity).await?;
    Ok(Json(documents))
}

/// `GET /api/v1/documents/trash`
pub async fn trash_handler(
    State(state): State<AppState>,
    CallerIdentity(identity): CallerIdentity,
) -> Result<Json<Vec<Document>>, AppError> {
    let documents = state.documents.trash(&identity).await?;
    Ok(Json(documents))
}

/// `GET /api/v1/documents/{id}` — the one route with an anonymous path.
pub async fn get_handler(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Path(id): Path<DocumentId>,
) -> Result<Json<Document>, AppError> {
    let document = state.documents.get_by_id(identity.as_ref(), &id).await?;
    Ok(Json(document))
}

/// `PATCH /api/v1/documents/{id}`
pub async fn update_handler(
    State(state): State<AppState>,
    CallerIdentity(identity): CallerIdentity,
    Path(id): Path<DocumentId>,
    Json(update): Json<UpdateDocument>,
) -> Result<Json<Document>, AppError> {
    let document = state.documents.update(&identity, &id, update).await?;
    Ok(Json(document))
}

/// `POST /api/v1/documents/{id}/archive`
pub async fn archive_handler(
    State(state): State<AppState>,
    CallerIdentity(identity): CallerIdentity,
    Path(id): Path<DocumentId>,
) -> Result<Json<Document>, AppError> {
    let (document, _cascade) = state.documents.archive(&identity, &id).await?;
    Ok(Json(document))
}

/// `POST /api/v1/documents/{id}/restore`
pub async fn restore_handler(
    State(state): State<AppState>,
    CallerIdentity(identity): CallerIdentity,
    Path(id): Path<DocumentId>,
) -> Result<Json<Document>, AppError> {
    let (document, _cascade) = state.documents.restore(&identity, &id).await?;
    Ok(Json(document))
}

/// `DELETE /api/v1/documents/{id}`
pub async fn remove_handler(
    State(state): State<AppState>,
    CallerIdentity(identity): CallerIdentity,
    Path(id): Path<DocumentId>,
) -> Result<Json<Document>, AppError> {
    let document = state.documents.remove(&identity, &id).await?;
    Ok(Json(document))
}

/// `DELETE /api/v1/documents/{id}/icon`
pub async fn remove_icon_handler(
    State(state): State<AppState>,
    CallerIdentity(identity): CallerIdentity,
    Path(id): Path<DocumentId>,
) -> Result<Json<Document>, AppError> {
    let document = state.documents.remove_icon(&identity, &id).await?;
    Ok(Json(document))
}

/// `DELETE /api/v1/documents/{id}/cover-image`
pub async fn remove_cover_image_handler(
    State(state): State<AppState>,
    CallerIdentity(identity): CallerIdentity,
    Path(id): Path<DocumentId>,
) -> Result<Json<Document>, AppError> {
    let document = state.documents.remove_cover_image(&identity, &id).await?;
    Ok(Json(document))
}
