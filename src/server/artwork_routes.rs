use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::metadata::TrackArtwork;
use crate::server::state::{GuardedArtworkResolver, ServerState};

#[derive(Debug, Deserialize)]
pub struct ArtworkQuery {
    pub artist: String,
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct ArtworkCacheStats {
    pub size: usize,
}

/// GET /?artist=..&title=.. - Always answers with some image URL
async fn get_artwork(
    State(resolver): State<GuardedArtworkResolver>,
    Query(query): Query<ArtworkQuery>,
) -> impl IntoResponse {
    let url = resolver.resolve_artwork(&query.artist, &query.title).await;
    Json(TrackArtwork {
        url,
        artist: query.artist,
        title: query.title,
    })
}

async fn get_cache_stats(State(resolver): State<GuardedArtworkResolver>) -> impl IntoResponse {
    Json(ArtworkCacheStats {
        size: resolver.cache_size(),
    })
}

async fn clear_cache(State(resolver): State<GuardedArtworkResolver>) -> impl IntoResponse {
    let size = resolver.cache_size();
    resolver.clear_cache();
    info!("Artwork cache cleared ({} entries)", size);
    StatusCode::NO_CONTENT
}

pub fn artwork_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(get_artwork))
        .route("/cache", get(get_cache_stats).delete(clear_cache))
}
