use serde::{Deserialize, Serialize};

/// A radio station. Stations scope songs and rating limits.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub stream_url: String,
    pub metadata_url: String,
    /// Upstream now-playing feed proxied by the metadata endpoint.
    #[serde(skip_serializing)]
    pub upstream_metadata_url: Option<String>,
    pub is_active: bool,
    pub display_order: i32,
    pub stream_format: Option<String>,
    pub stream_quality: Option<String>,
    pub stream_codec: Option<String>,
    pub stream_bitrate: Option<String>,
    pub genre: Option<String>,
    pub tagline: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub source_info: Option<String>,
    pub created: i64,
    pub updated: i64,
}

/// Station definition as written in the `[[stations]]` config section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StationSeed {
    pub code: String,
    pub name: String,
    pub stream_url: String,
    pub metadata_url: String,
    #[serde(default)]
    pub upstream_metadata_url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default)]
    pub stream_format: Option<String>,
    #[serde(default)]
    pub stream_quality: Option<String>,
    #[serde(default)]
    pub stream_codec: Option<String>,
    #[serde(default)]
    pub stream_bitrate: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_info: Option<String>,
}

fn default_active() -> bool {
    true
}

impl StationSeed {
    /// Minimal active station, mostly useful in tests.
    pub fn new(code: &str, name: &str, display_order: i32) -> Self {
        let lower = code.to_lowercase();
        StationSeed {
            code: code.to_string(),
            name: name.to_string(),
            stream_url: format!("/hls/{}/index.m3u8", lower),
            metadata_url: format!("/v1/metadata/{}", code),
            upstream_metadata_url: None,
            is_active: true,
            display_order,
            stream_format: None,
            stream_quality: None,
            stream_codec: None,
            stream_bitrate: None,
            genre: None,
            tagline: None,
            logo_url: None,
            description: None,
            source_info: None,
        }
    }
}
