use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::{HeaderValue, Method},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{AllowHeaders, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use super::alert_routes::alert_routes;
use super::artwork_routes::artwork_routes;
use super::metadata_routes::metadata_routes;
use crate::metrics::metrics_handler;
use super::rating_routes::rating_routes;
use super::station_routes::station_routes;
use super::{log_requests, state::*, ServerConfig};
use crate::environment::{detect_deployment_mode, EnvironmentInfo};

pub const SERVICE_NAME: &str = "radioawa-server";

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

#[derive(Serialize)]
struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

async fn health() -> impl IntoResponse {
    Json(HealthStatus {
        status: "UP",
        service: SERVICE_NAME,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

async fn environment(State(state): State<ServerState>) -> impl IntoResponse {
    Json(EnvironmentInfo {
        deployment_mode: detect_deployment_mode(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: state.hash.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

fn make_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    // Credentials can't be combined with a wildcard, so mirror the request headers.
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60))
}

pub fn make_app(
    config: ServerConfig,
    station_store: GuardedStationStore,
    rating_engine: GuardedRatingEngine,
    artwork_resolver: GuardedArtworkResolver,
    now_playing: GuardedNowPlayingService,
    alert_store: GuardedAlertStore,
) -> Result<Router> {
    let state = ServerState {
        config: config.clone(),
        start_time: Instant::now(),
        hash: env!("GIT_HASH").to_owned(),
        station_store,
        rating_engine,
        artwork_resolver,
        now_playing,
        alert_store,
    };

    let v1_routes: Router = Router::new()
        .route("/health", get(health))
        .route("/environment", get(environment))
        .nest("/stations", station_routes())
        .nest("/ratings", rating_routes())
        .nest("/artwork", artwork_routes())
        .nest("/metadata", metadata_routes())
        .nest("/alerts", alert_routes())
        .with_state(state.clone());

    let home_router: Router = match &config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let app: Router = home_router
        .nest("/v1", v1_routes)
        .layer(make_cors_layer(&config.cors_allowed_origins))
        .layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

pub async fn run_server(config: ServerConfig, app: Router, metrics_port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    info!("Ready to serve at port {}!", config.port);
    info!("Metrics available at port {}!", metrics_port);

    let metrics_server = axum::serve(metrics_listener, make_metrics_app())
        .with_graceful_shutdown(shutdown_signal());
    let api_server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal());

    tokio::try_join!(
        async { api_server.await.context("API server failed") },
        async { metrics_server.await.context("Metrics server failed") },
    )?;
    Ok(())
}
