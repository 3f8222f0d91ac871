//! Now-playing metadata for stations, enriched with album artwork.

use crate::artwork::ArtworkResolver;
use crate::station::Station;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_TRACK: &str = "Unknown Track";
const FALLBACK_ARTIST: &str = "RadioAwa";
const FALLBACK_ALBUM: &str = "Live Stream";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackArtwork {
    pub url: String,
    pub artist: String,
    pub title: String,
}

pub struct NowPlayingService {
    client: reqwest::Client,
    artwork: Arc<ArtworkResolver>,
}

impl NowPlayingService {
    pub fn new(artwork: Arc<ArtworkResolver>, timeout_sec: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create metadata HTTP client")?;
        Ok(Self { client, artwork })
    }

    /// Upstream metadata of the station with an `album_art` field added.
    /// Falls back to a generic "live stream" entry when the station has no
    /// upstream feed or the feed cannot be read.
    pub async fn now_playing(&self, station: &Station) -> Map<String, Value> {
        match self.fetch_upstream(station).await {
            Ok(mut metadata) => {
                let (artist, title) = current_track(&metadata);
                let album_art = self.artwork.resolve_artwork(&artist, &title).await;
                metadata.insert("album_art".to_string(), Value::String(album_art));
                info!(
                    "{} metadata enriched with album art for: {} - {}",
                    station.code, artist, title
                );
                metadata
            }
            Err(err) => {
                warn!("Error fetching {} station metadata: {:#}", station.code, err);
                fallback_now_playing(station, self.artwork.fallback_url(FALLBACK_ARTIST))
            }
        }
    }

    /// Artwork of the track currently playing on the station.
    pub async fn current_artwork(&self, station: &Station) -> TrackArtwork {
        let (artist, title) = match self.fetch_upstream(station).await {
            Ok(metadata) => current_track(&metadata),
            Err(err) => {
                warn!("Error fetching {} station metadata: {:#}", station.code, err);
                (FALLBACK_ARTIST.to_string(), station.name.clone())
            }
        };
        let url = self.artwork.resolve_artwork(&artist, &title).await;
        TrackArtwork { url, artist, title }
    }

    async fn fetch_upstream(&self, station: &Station) -> Result<Map<String, Value>> {
        let Some(url) = station.upstream_metadata_url.as_deref() else {
            bail!("Station {} has no upstream metadata feed", station.code);
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to reach metadata feed {}", url))?;
        if !response.status().is_success() {
            bail!(
                "Metadata feed {} failed with status {}",
                url,
                response.status()
            );
        }
        match response
            .json::<Value>()
            .await
            .context("Failed to parse metadata feed")?
        {
            Value::Object(map) => Ok(map),
            other => bail!("Metadata feed returned a non-object: {}", other),
        }
    }
}

/// (artist, title) from upstream metadata, with placeholders for missing keys.
pub fn current_track(metadata: &Map<String, Value>) -> (String, String) {
    let field = |key: &str, default: &str| match metadata.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    (field("artist", UNKNOWN_ARTIST), field("title", UNKNOWN_TRACK))
}

pub fn fallback_now_playing(station: &Station, album_art: String) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("artist".to_string(), Value::from(FALLBACK_ARTIST));
    metadata.insert("title".to_string(), Value::from(station.name.clone()));
    metadata.insert("album".to_string(), Value::from(FALLBACK_ALBUM));
    metadata.insert("album_art".to_string(), Value::from(album_art));
    metadata
}
