mod file_config;

pub use file_config::{ArtworkConfig, FileConfig, MetadataConfig, RatingsConfig};

use crate::artwork::{DEFAULT_FALLBACK_IMAGE_BASE, ITUNES_SEARCH_URL};
use crate::rating::RatingPolicy;
use crate::server::RequestsLoggingLevel;
use crate::station::StationSeed;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_CORS_ALLOWED_ORIGINS: &[&str] = &["http://localhost:5171", "http://frontend:5171"];

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub db_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub cors_allowed_origins: Vec<String>,

    // Feature configs (with defaults)
    pub ratings: RatingPolicy,
    pub artwork: ArtworkSettings,
    pub metadata: MetadataSettings,
    pub stations: Vec<StationSeed>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtworkSettings {
    pub search_url: String,
    pub timeout_sec: u64,
    pub fallback_image_base: String,
}

impl Default for ArtworkSettings {
    fn default() -> Self {
        Self {
            search_url: ITUNES_SEARCH_URL.to_string(),
            timeout_sec: 5,
            fallback_image_base: DEFAULT_FALLBACK_IMAGE_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataSettings {
    pub timeout_sec: u64,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self { timeout_sec: 10 }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let cors_allowed_origins = file.cors_allowed_origins.unwrap_or_else(|| {
            DEFAULT_CORS_ALLOWED_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect()
        });

        let ratings_file = file.ratings.unwrap_or_default();
        let default_policy = RatingPolicy::default();
        let ratings = RatingPolicy {
            max_votes_per_window: ratings_file
                .max_votes_per_window
                .unwrap_or(default_policy.max_votes_per_window),
            window_secs: ratings_file
                .window_secs
                .unwrap_or(default_policy.window_secs),
        };
        if ratings.max_votes_per_window == 0 {
            bail!("ratings.max_votes_per_window must be greater than 0");
        }
        if ratings.window_secs == 0 {
            bail!("ratings.window_secs must be greater than 0");
        }

        let artwork_file = file.artwork.unwrap_or_default();
        let artwork_defaults = ArtworkSettings::default();
        let artwork = ArtworkSettings {
            search_url: artwork_file
                .search_url
                .unwrap_or(artwork_defaults.search_url),
            timeout_sec: artwork_file
                .timeout_sec
                .unwrap_or(artwork_defaults.timeout_sec),
            fallback_image_base: artwork_file
                .fallback_image_base
                .unwrap_or(artwork_defaults.fallback_image_base),
        };

        let metadata = MetadataSettings {
            timeout_sec: file
                .metadata
                .and_then(|m| m.timeout_sec)
                .unwrap_or(MetadataSettings::default().timeout_sec),
        };

        let stations = file.stations.unwrap_or_default();
        let mut seen_codes = std::collections::HashSet::new();
        for station in &stations {
            if station.code.trim().is_empty() {
                bail!("Station code must not be empty");
            }
            if !seen_codes.insert(station.code.as_str()) {
                bail!("Station {} is configured more than once", station.code);
            }
        }

        Ok(Self {
            db_dir,
            port,
            metrics_port,
            logging_level,
            frontend_dir_path,
            cors_allowed_origins,
            ratings,
            artwork,
            metadata,
            stations,
        })
    }

    pub fn radio_db_path(&self) -> PathBuf {
        self.db_dir.join("radio.db")
    }

    pub fn alerts_db_path(&self) -> PathBuf {
        self.db_dir.join("alerts.db")
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
