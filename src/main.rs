use std::sync::Arc;

use notebase::app::{self, AppConfig, AppState};
use notebase::auth::provider::JwtIdentityProvider;
use notebase::db::store::{DocumentStore, MongoDocumentStore};
use notebase::documents::service::DocumentService;
use notebase::storage::client::{S3StorageClient, StorageClient};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notebase=info,tower_http=info".into()),
        )
        .init();

    tracing::info!("Starting Notebase server...");

    let config = AppConfig::from_env();

    // Connect to MongoDB
    let mongo_client = mongodb::Client::with_uri_str(&config.mongodb_uri)
        .await
        .expect("Failed to connect to MongoDB");
    let mongo_db = mongo_client.database(&config.mongodb_database);

    let mongo_store = MongoDocumentStore::new(&mongo_db);
    mongo_store
        .ensure_indexes()
        .await
        .expect("Failed to create document indexes");
    let store: Arc<dyn DocumentStore> = Arc::new(mongo_store);

    tracing::info!("Connected to MongoDB");

    // Connect to S3
    let storage_client: Arc<dyn StorageClient> = Arc::new(
        S3StorageClient::from_env()
            .await
            .expect("Failed to initialize S3 client"),
    );

    tracing::info!("S3 storage client initialized");

    // Build application state
    let app_state = AppState {
        documents: DocumentService::new(store),
        storage_client,
        identity: Arc::new(JwtIdentityProvider::new(&config.jwt_secret)),
    };

    let app = app::router(app_state);

    // Start the server
    tracing::info!("Listening on http://{}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app.into_make_service())
        .await
        .expect("Server error");
}
