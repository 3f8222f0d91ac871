use crate::station::StationSeed;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_dir: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub frontend_dir_path: Option<String>,
    pub cors_allowed_origins: Option<Vec<String>>,

    // Feature configs
    pub ratings: Option<RatingsConfig>,
    pub artwork: Option<ArtworkConfig>,
    pub metadata: Option<MetadataConfig>,
    pub stations: Option<Vec<StationSeed>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RatingsConfig {
    pub max_votes_per_window: Option<u32>,
    pub window_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ArtworkConfig {
    pub search_url: Option<String>,
    pub timeout_sec: Option<u64>,
    pub fallback_image_base: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct MetadataConfig {
    pub timeout_sec: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
