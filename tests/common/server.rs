//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own databases.

use super::constants::*;
use super::fixtures::{spawn_upstream_feed, test_stations, FakeArtworkSearch};
use radioawa_server::alerts::{AlertStore, SqliteAlertStore};
use radioawa_server::artwork::{ArtworkCache, ArtworkResolver};
use radioawa_server::metadata::NowPlayingService;
use radioawa_server::radio_store::SqliteRadioStore;
use radioawa_server::rating::{RatingEngine, RatingPolicy, RatingStore};
use radioawa_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use radioawa_server::station::StationStore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with isolated databases
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Artwork search behind the resolver, for counting lookups
    pub artwork_search: Arc<FakeArtworkSearch>,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    _upstream_shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl TestServer {
    /// Spawns a new test server on a random port with the default rating policy
    pub async fn spawn() -> Self {
        Self::spawn_with_policy(RatingPolicy::default()).await
    }

    /// Spawns a new test server on a random port
    ///
    /// This function:
    /// 1. Starts a fake upstream metadata feed for the English station
    /// 2. Creates temporary radio and alert databases with the test stations
    /// 3. Binds to a random port (127.0.0.1:0)
    /// 4. Spawns the server in a background task
    /// 5. Waits for the server to be ready
    ///
    /// # Panics
    ///
    /// Panics if database creation, port binding or startup fails.
    pub async fn spawn_with_policy(policy: RatingPolicy) -> Self {
        let (upstream_url, upstream_shutdown_tx) = spawn_upstream_feed().await;

        let temp_db_dir = TempDir::new().expect("Failed to create temp db dir");
        let radio_store = Arc::new(
            SqliteRadioStore::new(temp_db_dir.path().join("radio.db"))
                .expect("Failed to open radio store"),
        );
        for seed in test_stations(Some(upstream_url)) {
            radio_store
                .upsert_station(&seed)
                .expect("Failed to seed station");
        }
        let alert_store: Arc<dyn AlertStore> = Arc::new(
            SqliteAlertStore::new(temp_db_dir.path().join("alerts.db"))
                .expect("Failed to open alert store"),
        );

        let artwork_search = Arc::new(FakeArtworkSearch::default());
        let artwork_resolver = Arc::new(ArtworkResolver::new(
            Arc::new(ArtworkCache::new()),
            artwork_search.clone(),
            FALLBACK_IMAGE_BASE,
        ));
        let now_playing = Arc::new(
            NowPlayingService::new(artwork_resolver.clone(), 2)
                .expect("Failed to create metadata client"),
        );
        let rating_engine = Arc::new(RatingEngine::new(
            radio_store.clone() as Arc<dyn RatingStore>,
            policy,
        ));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            ..Default::default()
        };

        let app = make_app(
            config,
            radio_store as Arc<dyn StationStore>,
            rating_engine,
            artwork_resolver,
            now_playing,
            alert_store,
        )
        .expect("Failed to build app");

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            artwork_search,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
            _upstream_shutdown_tx: upstream_shutdown_tx,
        };

        server.wait_for_ready().await;

        server
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
        // Send shutdown signal
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
        // The upstream feed stops when its sender is dropped
    }
}
