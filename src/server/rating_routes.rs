//! Song rating HTTP routes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::rating::{RatingCounts, RatingError, RatingOutcome, RatingRequest, SubmitStatus};
use crate::server::client_ip::ClientIp;
use crate::metrics::{record_error, record_rate_limit_hit, record_rating_submission};
use crate::server::state::{GuardedRatingEngine, ServerState};

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of a successful POST /v1/ratings
#[derive(Debug, Serialize)]
pub struct RatingResponse {
    #[serde(flatten)]
    pub counts: RatingCounts,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountsQuery {
    pub station_code: String,
    pub artist: String,
    pub title: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl IntoResponse for RatingError {
    fn into_response(self) -> Response {
        let status = match &self {
            RatingError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            RatingError::StationNotFound(_) => StatusCode::NOT_FOUND,
            RatingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match &self {
            RatingError::Storage(err) => format!("Failed to submit rating: {}", err),
            other => other.to_string(),
        };
        (status, Json(MessageResponse::new(message))).into_response()
    }
}

fn blank_field(request: &RatingRequest) -> Option<&'static str> {
    [
        ("stationCode", &request.station_code),
        ("artist", &request.artist),
        ("title", &request.title),
        ("userId", &request.user_id),
    ]
    .into_iter()
    .find(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| name)
}

fn outcome_label(result: &Result<RatingOutcome, RatingError>) -> &'static str {
    match result {
        Ok(outcome) => match outcome.status {
            SubmitStatus::Created => "created",
            SubmitStatus::Updated => "updated",
            SubmitStatus::AlreadyRecorded => "already_recorded",
        },
        Err(RatingError::RateLimitExceeded { .. }) => "rate_limited",
        Err(RatingError::StationNotFound(_)) => "station_not_found",
        Err(RatingError::Storage(_)) => "error",
    }
}

/// POST / - Submit or change a vote
async fn submit_rating(
    State(engine): State<GuardedRatingEngine>,
    ClientIp(ip_address): ClientIp,
    Json(mut request): Json<RatingRequest>,
) -> Response {
    if let Some(field) = blank_field(&request) {
        return (
            StatusCode::BAD_REQUEST,
            Json(MessageResponse::new(format!("{} is required", field))),
        )
            .into_response();
    }
    request.ip_address = ip_address;
    debug!(
        "Rating {:?} for {} - {} on {} from {}",
        request.rating_type, request.artist, request.title, request.station_code, request.ip_address
    );

    let station_code = request.station_code.clone();
    let result = match tokio::task::spawn_blocking(move || engine.submit_rating(&request)).await {
        Ok(result) => result,
        Err(err) => {
            error!("Rating submission task failed: {}", err);
            record_error("task_join", "/v1/ratings");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse::new("Failed to submit rating")),
            )
                .into_response();
        }
    };

    record_rating_submission(&station_code, outcome_label(&result));
    match result {
        Ok(outcome) => {
            let message = outcome.message().to_string();
            Json(RatingResponse {
                counts: outcome.counts,
                message,
            })
            .into_response()
        }
        Err(err) => {
            match &err {
                RatingError::RateLimitExceeded { .. } => {
                    record_rate_limit_hit(&station_code);
                    warn!("Rate limit hit on station {}", station_code);
                }
                RatingError::StationNotFound(_) => debug!("{}", err),
                RatingError::Storage(cause) => {
                    record_error("storage", "/v1/ratings");
                    error!("Failed to submit rating: {:#}", cause);
                }
            }
            err.into_response()
        }
    }
}

/// GET /counts - Current counts of a song, with the voter's own vote if any
async fn get_counts(
    State(engine): State<GuardedRatingEngine>,
    Query(query): Query<CountsQuery>,
) -> Response {
    let result = tokio::task::spawn_blocking(move || {
        engine.get_counts(
            &query.station_code,
            &query.artist,
            &query.title,
            query.user_id.as_deref(),
        )
    })
    .await;

    match result {
        Ok(Ok(counts)) => Json(counts).into_response(),
        Ok(Err(RatingError::Storage(err))) => {
            error!("Failed to get rating counts: {:#}", err);
            record_error("storage", "/v1/ratings/counts");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Ok(Err(err)) => err.into_response(),
        Err(err) => {
            error!("Rating counts task failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Build the rating routes:
/// - POST /
/// - GET /counts
pub fn rating_routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(submit_rating))
        .route("/counts", get(get_counts))
}
