use serde::{Deserialize, Serialize};

pub const DEFAULT_ALERT_STATUS: &str = "NEW";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub severity: String,
    pub status: String,
    pub source_ip: Option<String>,
    pub destination_ip: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Client supplied alert fields, used for both creation and replacement.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub source_ip: Option<String>,
    #[serde(default)]
    pub destination_ip: Option<String>,
}

impl AlertDraft {
    /// Returns a description of the first invalid field, if any.
    pub fn validation_error(&self) -> Option<&'static str> {
        if self.title.trim().is_empty() {
            return Some("Title is required");
        }
        if self.severity.trim().is_empty() {
            return Some("Severity is required");
        }
        None
    }

    pub fn status_or_default(&self) -> &str {
        self.status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_ALERT_STATUS)
    }
}
