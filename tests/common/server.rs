//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own catalog database.

use super::client::TestClient;
use super::constants::*;
use super::fixtures::seed_catalog;
use splat_catalog_server::catalog_store::SqliteCatalogStore;
use splat_catalog_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with an isolated catalog database
///
/// When dropped, the server gracefully shuts down and the temp dir is removed.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server over an empty catalog, debug routes disabled
    pub async fn spawn() -> Self {
        Self::spawn_with(false).await
    }

    /// Spawns a server and seeds it with the fixture catalog
    pub async fn spawn_seeded() -> Self {
        let server = Self::spawn().await;
        seed_catalog(&server.client()).await;
        server
    }

    /// Spawns a server on a random port
    ///
    /// # Panics
    ///
    /// Panics if the store cannot be opened, the port cannot be bound or
    /// the server doesn't become ready within timeout.
    pub async fn spawn_with(enable_debug_routes: bool) -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");
        let catalog_store = Arc::new(
            SqliteCatalogStore::new(temp_db_dir.path().join("catalog.db"), 2)
                .expect("Failed to open catalog store"),
        );

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            enable_debug_routes,
            ..Default::default()
        };
        let app = make_app(config, catalog_store);

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    pub fn client(&self) -> TestClient {
        TestClient::new(self.base_url.clone())
    }

    /// Waits for the server to become ready by polling the / endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
