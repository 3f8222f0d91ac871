//! Security alert HTTP routes.
//!
//! Provides endpoints for:
//! - Listing alerts, optionally filtered by severity or status
//! - Creating, replacing and deleting single alerts

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::{error, info};

use crate::alerts::{Alert, AlertDraft};
use crate::metrics::record_error;
use crate::server::blocking::run_blocking;
use crate::server::state::{GuardedAlertStore, ServerState};

#[derive(Debug, Serialize)]
struct ValidationError {
    error: &'static str,
}

fn storage_error(err: anyhow::Error, endpoint: &str) -> Response {
    error!("Alert storage failure: {:#}", err);
    record_error("storage", endpoint);
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

fn alerts_response(result: anyhow::Result<Vec<Alert>>, endpoint: &str) -> Response {
    match result {
        Ok(alerts) => Json(alerts).into_response(),
        Err(err) => storage_error(err, endpoint),
    }
}

fn validate(draft: &AlertDraft) -> Result<(), Response> {
    match draft.validation_error() {
        Some(error) => Err((StatusCode::BAD_REQUEST, Json(ValidationError { error })).into_response()),
        None => Ok(()),
    }
}

async fn list_alerts(State(store): State<GuardedAlertStore>) -> Response {
    alerts_response(run_blocking(move || store.list_alerts()).await, "/v1/alerts")
}

async fn get_alert(State(store): State<GuardedAlertStore>, Path(id): Path<i64>) -> Response {
    match run_blocking(move || store.get_alert(id)).await {
        Ok(Some(alert)) => Json(alert).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => storage_error(err, "/v1/alerts/{id}"),
    }
}

async fn create_alert(
    State(store): State<GuardedAlertStore>,
    Json(draft): Json<AlertDraft>,
) -> Response {
    if let Err(response) = validate(&draft) {
        return response;
    }
    match run_blocking(move || store.create_alert(&draft)).await {
        Ok(alert) => {
            info!("Created alert {} ({})", alert.id, alert.severity);
            (StatusCode::CREATED, Json(alert)).into_response()
        }
        Err(err) => storage_error(err, "/v1/alerts"),
    }
}

async fn update_alert(
    State(store): State<GuardedAlertStore>,
    Path(id): Path<i64>,
    Json(draft): Json<AlertDraft>,
) -> Response {
    if let Err(response) = validate(&draft) {
        return response;
    }
    match run_blocking(move || store.update_alert(id, &draft)).await {
        Ok(Some(alert)) => Json(alert).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => storage_error(err, "/v1/alerts/{id}"),
    }
}

async fn delete_alert(State(store): State<GuardedAlertStore>, Path(id): Path<i64>) -> Response {
    match run_blocking(move || store.delete_alert(id)).await {
        Ok(true) => {
            info!("Deleted alert {}", id);
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => storage_error(err, "/v1/alerts/{id}"),
    }
}

async fn list_alerts_by_severity(
    State(store): State<GuardedAlertStore>,
    Path(severity): Path<String>,
) -> Response {
    alerts_response(
        run_blocking(move || store.list_alerts_by_severity(&severity)).await,
        "/v1/alerts/severity/{severity}",
    )
}

async fn list_alerts_by_status(
    State(store): State<GuardedAlertStore>,
    Path(status): Path<String>,
) -> Response {
    alerts_response(
        run_blocking(move || store.list_alerts_by_status(&status)).await,
        "/v1/alerts/status/{status}",
    )
}

/// Build the alert routes.
///
/// - GET, POST /
/// - GET, PUT, DELETE /{id}
/// - GET /severity/{severity}
/// - GET /status/{status}
pub fn alert_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(list_alerts).post(create_alert))
        .route(
            "/{id}",
            get(get_alert).put(update_alert).delete(delete_alert),
        )
        .route("/severity/{severity}", get(list_alerts_by_severity))
        .route("/status/{status}", get(list_alerts_by_status))
}
