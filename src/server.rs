/// Server setup and initialization
///
/// Wires together storage, the dry-run engine and HTTP routes of the reference
/// workflow service.

use crate::{
    api::workflows::{create_workflow_routes, AppState},
    config::Config,
    runtime::engine::ExecutionEngine,
    workflow::storage::WorkflowStorage,
};
use anyhow::Result;
use axum::{routing::get, Router};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::{path::Path, str::FromStr, sync::Arc};
use tokio::net::TcpListener;

/// Open the workflow database, creating the file and its directory if needed
pub async fn connect_database(url: &str) -> Result<SqlitePool> {
    if let Some(path) = url
        .strip_prefix("sqlite://")
        .filter(|path| !path.starts_with(':'))
    {
        if let Some(dir) = Path::new(path).parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tracing::info!("📁 Ensuring data directory exists: {}", dir.display());
            std::fs::create_dir_all(dir)
                .map_err(|e| anyhow::anyhow!("Failed to create data directory: {}", e))?;
        }
    }

    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    // In-memory databases are per connection, so keep a single one
    let max_connections = if url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Build the router over an initialized storage
pub fn create_router(storage: WorkflowStorage) -> Router {
    let app_state = AppState {
        storage,
        engine: Arc::new(ExecutionEngine::new()),
    };

    Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        // Workflow service API routes
        .merge(create_workflow_routes().with_state(app_state))
}

/// Create the main Axum application with all routes
pub async fn create_app(config: Config) -> Result<Router> {
    tracing::info!("📋 Initializing workflow storage at {}", config.database.url);
    let pool = connect_database(&config.database.url).await?;
    let storage = WorkflowStorage::new(pool);
    storage
        .init_schema()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize workflow schema: {}", e))?;

    tracing::info!("📡 Creating HTTP router with all endpoints");
    let app = create_router(storage);

    tracing::info!("✅ Application initialized successfully");
    Ok(app)
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting Tradeflow workflow service...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}
