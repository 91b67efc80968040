mod common;

use axum::http::StatusCode;
use notebase::db::models::Document;
use notebase::db::store::DocumentStore;

#[tokio::test]
async fn mutations_require_authentication() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();

    let response = server
        .post("/api/v1/documents")
        .json(&serde_json::json!({ "title": "Nope" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    for path in [
        "/api/v1/documents",
        "/api/v1/documents/search",
        "/api/v1/documents/trash",
    ] {
        let response = server.get(path).await;
        assert_eq!(
            response.status_code(),
            StatusCode::UNAUTHORIZED,
            "listing {path} must not be anonymous"
        );
    }
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();

    let response = server
        .get("/api/v1/documents")
        .add_header("authorization", "Bearer not-a-real-token")
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ownership_is_isolated_between_users() {
    let env = common::TestEnv::start().await;
    let server = env.server();
    let permissive = env.server_permissive();

    let doc = env.create_document(&server, "u1", "Private notes", None).await;

    // Another user can neither read nor mutate it
    let read = permissive
        .get(&format!("/api/v1/documents/{}", doc.id))
        .add_header("authorization", common::bearer("u2"))
        .await;
    assert_eq!(read.status_code(), StatusCode::FORBIDDEN);

    let update = permissive
        .patch(&format!("/api/v1/documents/{}", doc.id))
        .add_header("authorization", common::bearer("u2"))
        .json(&serde_json::json!({ "title": "Hijacked" }))
        .await;
    assert_eq!(update.status_code(), StatusCode::FORBIDDEN);

    let archive = permissive
        .post(&format!("/api/v1/documents/{}/archive", doc.id))
        .add_header("authorization", common::bearer("u2"))
        .await;
    assert_eq!(archive.status_code(), StatusCode::FORBIDDEN);

    let delete = permissive
        .delete(&format!("/api/v1/documents/{}", doc.id))
        .add_header("authorization", common::bearer("u2"))
        .await;
    assert_eq!(delete.status_code(), StatusCode::FORBIDDEN);

    // And nothing changed
    let stored = env.store.get(&doc.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Private notes");
    assert!(!stored.is_archived);
}

#[tokio::test]
async fn creating_under_someone_elses_parent_is_rejected() {
    let env = common::TestEnv::start().await;
    let server = env.server();
    let permissive = env.server_permissive();

    let parent = env.create_document(&server, "u1", "Parent", None).await;

    let response = permissive
        .post("/api/v1/documents")
        .add_header("authorization", common::bearer("u2"))
        .json(&serde_json::json!({ "title": "Child", "parent_id": parent.id }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn published_documents_are_readable_anonymously() {
    let env = common::TestEnv::start().await;
    let server = env.server();
    let permissive = env.server_permissive();

    let doc = env.create_document(&server, "u1", "Shared page", None).await;
    server
        .patch(&format!("/api/v1/documents/{}", doc.id))
        .add_header("authorization", common::bearer("u1"))
        .json(&serde_json::json!({ "is_published": true, "content": "hello" }))
        .await;

    // No Authorization header at all
    let fetched: Document = server
        .get(&format!("/api/v1/documents/{}", doc.id))
        .await
        .json();
    assert_eq!(fetched.id, doc.id);
    assert_eq!(fetched.content.as_deref(), Some("hello"));

    // Archiving takes it out of anonymous reach
    server
        .post(&format!("/api/v1/documents/{}/archive", doc.id))
        .add_header("authorization", common::bearer("u1"))
        .await;

    let response = permissive
        .get(&format!("/api/v1/documents/{}", doc.id))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    // The owner still reads it
    let owned: Document = server
        .get(&format!("/api/v1/documents/{}", doc.id))
        .add_header("authorization", common::bearer("u1"))
        .await
        .json();
    assert!(owned.is_archived);
}

#[tokio::test]
async fn missing_documents_are_not_found_for_everyone() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();

    let path = format!("/api/v1/documents/{}", uuid::Uuid::new_v4());

    let anonymous = server.get(&path).await;
    assert_eq!(anonymous.status_code(), StatusCode::NOT_FOUND);

    let authenticated = server
        .get(&path)
        .add_header("authorization", common::bearer("u1"))
        .await;
    assert_eq!(authenticated.status_code(), StatusCode::NOT_FOUND);
}
