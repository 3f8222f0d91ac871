//! Now-playing metadata proxy routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::error;

use crate::metrics::record_error;
use crate::server::blocking::run_blocking;
use crate::server::state::ServerState;
use crate::station::Station;

async fn find_station(state: &ServerState, code: &str) -> Result<Station, Response> {
    let store = state.station_store.clone();
    let lookup = code.to_string();
    match run_blocking(move || store.get_station_by_code(&lookup)).await {
        Ok(Some(station)) => Ok(station),
        Ok(None) => Err(StatusCode::NOT_FOUND.into_response()),
        Err(err) => {
            error!("Failed to load station {}: {:#}", code, err);
            record_error("storage", "/v1/metadata/{station_code}");
            Err(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}

/// GET /{station_code} - Upstream metadata with album art
async fn get_now_playing(
    State(state): State<ServerState>,
    Path(station_code): Path<String>,
) -> Response {
    let station = match find_station(&state, &station_code).await {
        Ok(station) => station,
        Err(response) => return response,
    };
    Json(state.now_playing.now_playing(&station).await).into_response()
}

/// GET /{station_code}/artwork - Artwork of the current track only
async fn get_now_playing_artwork(
    State(state): State<ServerState>,
    Path(station_code): Path<String>,
) -> Response {
    let station = match find_station(&state, &station_code).await {
        Ok(station) => station,
        Err(response) => return response,
    };
    Json(state.now_playing.current_artwork(&station).await).into_response()
}

pub fn metadata_routes() -> Router<ServerState> {
    Router::new()
        .route("/{station_code}", get(get_now_playing))
        .route("/{station_code}/artwork", get(get_now_playing_artwork))
}
