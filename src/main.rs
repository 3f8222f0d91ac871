use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::{fmt::Debug, path::PathBuf};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use radioawa_server::alerts::{AlertStore, SqliteAlertStore};
use radioawa_server::artwork::{ArtworkCache, ArtworkResolver, ArtworkSearch, ItunesSearchClient};
use radioawa_server::config;
use radioawa_server::metadata::NowPlayingService;
use radioawa_server::radio_store::SqliteRadioStore;
use radioawa_server::rating::{RatingEngine, RatingStore};
use radioawa_server::metrics;
use radioawa_server::server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
use radioawa_server::station::StationStore;

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

fn parse_dir(s: &str) -> Result<PathBuf, String> {
    let path = parse_path(s)?;
    if !path.exists() {
        return Err(format!("Directory does not exist: {}", s));
    }
    if !path.is_dir() {
        return Err(format!("Path is not a directory: {}", s));
    }
    Ok(path)
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory containing database files (radio.db, alerts.db).
    /// Can also be specified in config file.
    #[clap(long, value_parser = parse_dir)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 8081)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,
}

impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_dir: args.db_dir.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            frontend_dir_path: args.frontend_dir_path.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  db_dir: {:?}", app_config.db_dir);
    info!("  port: {}", app_config.port);
    info!(
        "  rating limit: {} votes per {}s",
        app_config.ratings.max_votes_per_window, app_config.ratings.window_secs
    );

    info!("Initializing metrics...");
    metrics::init_metrics();

    if !app_config.radio_db_path().exists() {
        info!(
            "Creating new radio database at {:?}",
            app_config.radio_db_path()
        );
    }
    let radio_store = Arc::new(SqliteRadioStore::new(app_config.radio_db_path())?);
    for seed in &app_config.stations {
        let station = radio_store.upsert_station(seed)?;
        info!("Station {} ready (id {})", station.code, station.id);
    }

    if !app_config.alerts_db_path().exists() {
        info!(
            "Creating new alerts database at {:?}",
            app_config.alerts_db_path()
        );
    }
    let alert_store: Arc<dyn AlertStore> =
        Arc::new(SqliteAlertStore::new(app_config.alerts_db_path())?);

    let artwork_search: Arc<dyn ArtworkSearch> = Arc::new(ItunesSearchClient::new(
        &app_config.artwork.search_url,
        app_config.artwork.timeout_sec,
    )?);
    let artwork_resolver = Arc::new(ArtworkResolver::new(
        Arc::new(ArtworkCache::new()),
        artwork_search,
        &app_config.artwork.fallback_image_base,
    ));
    let now_playing = Arc::new(NowPlayingService::new(
        artwork_resolver.clone(),
        app_config.metadata.timeout_sec,
    )?);

    let rating_engine = Arc::new(RatingEngine::new(
        radio_store.clone() as Arc<dyn RatingStore>,
        app_config.ratings,
    ));

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
        frontend_dir_path: app_config.frontend_dir_path.clone(),
        cors_allowed_origins: app_config.cors_allowed_origins.clone(),
    };
    let app = make_app(
        server_config.clone(),
        radio_store as Arc<dyn StationStore>,
        rating_engine,
        artwork_resolver,
        now_playing,
        alert_store,
    )?;

    run_server(server_config, app, app_config.metrics_port).await
}
