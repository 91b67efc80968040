use std::sync::Arc;
use std::time::Duration;

use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::minio::MinIO;
use testcontainers_modules::mongo::Mongo;

use notebase::app::{self, AppState};
use notebase::auth::models::Claims;
use notebase::auth::provider::JwtIdentityProvider;
use notebase::db::models::{Document, DocumentId};
use notebase::db::store::{DocumentStore, MongoDocumentStore};
use notebase::documents::service::DocumentService;
use notebase::storage::client::{S3StorageClient, StorageClient};

/// Shared secret between the test "identity provider" and the server.
pub const JWT_SECRET: &str = "test-secret";

/// Holds running containers and provides the Axum router for integration tests.
///
/// Containers are kept alive for as long as this struct lives. When dropped,
/// containers are stopped and cleaned up automatically.
pub struct TestEnv {
    _mongo: ContainerAsync<Mongo>,
    _minio: ContainerAsync<MinIO>,
    pub router: axum::Router,
    pub store: Arc<dyn DocumentStore>,
    pub storage: Arc<dyn StorageClient>,
}

impl TestEnv {
    /// Spin up containers and build an Axum router wired to real services.
    pub async fn start() -> Self {
        // Start containers concurrently
        let mongo_fut = Mongo::default().start();
        let minio_fut = MinIO::default().start();
        let (mongo_container, minio_container) = tokio::join!(mongo_fut, minio_fut);
        let mongo_container = mongo_container.expect("Failed to start MongoDB container");
        let minio_container = minio_container.expect("Failed to start MinIO container");

        // --- MongoDB ---
        let mongo_port = mongo_container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");
        let mongo_uri = format!("mongodb://127.0.0.1:{}", mongo_port);
        let mongo_client = mongodb::Client::with_uri_str(&mongo_uri)
            .await
            .expect("Failed to connect to MongoDB");
        let mongo_db = mongo_client.database("notebase_test");

        let mongo_store = MongoDocumentStore::new(&mongo_db);
        mongo_store
            .ensure_indexes()
            .await
            .expect("Failed to create indexes");
        let store: Arc<dyn DocumentStore> = Arc::new(mongo_store);

        // --- MinIO (S3) ---
        let minio_port = minio_container
            .get_host_port_ipv4(9000)
            .await
            .expect("Failed to get MinIO port");
        let minio_endpoint = format!("http://127.0.0.1:{}", minio_port);

        // Set env vars for AWS SDK to pick up MinIO credentials
        std::env::set_var("AWS_ACCESS_KEY_ID", "minioadmin");
        std::env::set_var("AWS_SECRET_ACCESS_KEY", "minioadmin");
        std::env::set_var("AWS_REGION", "us-east-1");

        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .endpoint_url(&minio_endpoint)
            .region(aws_config::Region::new("us-east-1"))
            .load()
            .await;

        let s3_client = aws_sdk_s3::Client::from_conf(
            aws_sdk_s3::config::Builder::from(&s3_config)
                .force_path_style(true)
                .build(),
        );

        // Create test bucket
        let bucket_name = "notebase-test";
        let _ = s3_client.create_bucket().bucket(bucket_name).send().await;

        let storage: Arc<dyn StorageClient> =
            Arc::new(S3StorageClient::new(s3_client, bucket_name.to_string()));

        // --- Build AppState ---
        let app_state = AppState {
            documents: DocumentService::new(store.clone()),
            storage_client: storage.clone(),
            identity: Arc::new(JwtIdentityProvider::new(JWT_SECRET)),
        };

        let router = app::router(app_state);

        Self {
            _mongo: mongo_container,
            _minio: minio_container,
            router,
            store,
            storage,
        }
    }

    /// Build an `axum_test::TestServer` from this environment's router.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .expect_success_by_default()
            .build(self.router.clone())
    }

    /// Build a `TestServer` that does NOT expect success by default (for error tests).
    pub fn server_permissive(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .build(self.router.clone())
    }

    /// Helper: create a document via the API and return it.
    pub async fn create_document(
        &self,
        server: &axum_test::TestServer,
        subject: &str,
        title: &str,
        parent_id: Option<&DocumentId>,
    ) -> Document {
        let body = match parent_id {
            Some(parent) => serde_json::json!({ "title": title, "parent_id": parent }),
            None => serde_json::json!({ "title": title }),
        };

        server
            .post("/api/v1/documents")
            .add_header("authorization", bearer(subject))
            .json(&body)
            .await
            .json::<Document>()
    }

    /// Helper: poll until the record's archive flag matches, or time out.
    ///
    /// Archive/restore cascades are fire-and-forget, so descendant state is
    /// only eventually consistent with the call's return.
    pub async fn wait_for_archive_state(&self, id: &DocumentId, expected: bool) -> bool {
        for _ in 0..100 {
            let state = self
                .store
                .get(id)
                .await
                .expect("store lookup failed")
                .map(|d| d.is_archived);
            if state == Some(expected) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        false
    }
}

/// Mint a bearer token the way the external identity provider would.
pub fn token(subject: &str) -> String {
    let claims = Claims {
        sub: subject.to_string(),
        email: None,
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to mint test token")
}

/// `Authorization` header value for the given subject.
pub fn bearer(subject: &str) -> String {
    format!("Bearer {}", token(subject))
}
