//! Test fixtures: station definitions, a fake artwork search and a fake
//! upstream now-playing feed.

use super::constants::*;
use async_trait::async_trait;
use axum::{routing::get, Json, Router};
use radioawa_server::artwork::{ArtworkSearch, ArtworkSearchError};
use radioawa_server::station::StationSeed;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::TcpListener;

/// Artwork search that only knows one track and counts its calls.
#[derive(Default)]
pub struct FakeArtworkSearch {
    calls: AtomicUsize,
}

impl FakeArtworkSearch {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtworkSearch for FakeArtworkSearch {
    async fn search_artwork(&self, term: &str) -> Result<Option<String>, ArtworkSearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if term == format!("{} {}", KNOWN_ARTIST, KNOWN_TITLE) {
            Ok(Some(KNOWN_ARTWORK_URL.to_string()))
        } else {
            Ok(None)
        }
    }
}

/// Stations configured on every test server.
pub fn test_stations(english_upstream_url: Option<String>) -> Vec<StationSeed> {
    let mut english = StationSeed::new(ENGLISH_STATION, "English Hits", 1);
    english.upstream_metadata_url = english_upstream_url;
    english.genre = Some("Pop".to_string());

    let hindi = StationSeed::new(HINDI_STATION, HINDI_STATION_NAME, 2);

    let mut archive = StationSeed::new(INACTIVE_STATION, "Archive", 3);
    archive.is_active = false;

    vec![english, hindi, archive]
}

/// Serves a fixed now-playing document on a random port.
/// Returns the feed URL and a sender that stops the feed when dropped.
pub async fn spawn_upstream_feed() -> (String, tokio::sync::oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind upstream feed");
    let port = listener
        .local_addr()
        .expect("Failed to get upstream address")
        .port();

    let app = Router::new().route(
        "/metadatav2.json",
        get(|| async {
            Json(json!({
                "artist": UPSTREAM_ARTIST,
                "title": UPSTREAM_TITLE,
                "album": UPSTREAM_ALBUM,
                "bit_depth": 16,
            }))
        }),
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Upstream feed failed");
    });

    (
        format!("http://127.0.0.1:{}/metadatav2.json", port),
        shutdown_tx,
    )
}
