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
use crate::server::state::{GuardedStationStore, ServerState};
use crate::station::Station;

fn stations_response(result: anyhow::Result<Vec<Station>>, endpoint: &str) -> Response {
    match result {
        Ok(stations) => Json(stations).into_response(),
        Err(err) => {
            error!("Failed to load stations: {:#}", err);
            record_error("storage", endpoint);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET / - Active stations, in display order
async fn get_active_stations(State(store): State<GuardedStationStore>) -> Response {
    stations_response(
        run_blocking(move || store.get_active_stations()).await,
        "/v1/stations",
    )
}

/// GET /all - Every station, including inactive ones
async fn get_all_stations(State(store): State<GuardedStationStore>) -> Response {
    stations_response(
        run_blocking(move || store.get_all_stations()).await,
        "/v1/stations/all",
    )
}

async fn get_station(
    State(store): State<GuardedStationStore>,
    Path(code): Path<String>,
) -> Response {
    let lookup = code.clone();
    match run_blocking(move || store.get_station_by_code(&lookup)).await {
        Ok(Some(station)) => Json(station).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to load station {}: {:#}", code, err);
            record_error("storage", "/v1/stations/{code}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn station_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(get_active_stations))
        .route("/all", get(get_all_stations))
        .route("/{code}", get(get_station))
}
