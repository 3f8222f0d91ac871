use super::models::{Alert, AlertDraft};
use anyhow::Result;

pub trait AlertStore: Send + Sync {
    /// Returns all alerts, newest first.
    fn list_alerts(&self) -> Result<Vec<Alert>>;

    /// Returns Ok(None) if the alert does not exist.
    fn get_alert(&self, id: i64) -> Result<Option<Alert>>;

    /// Stores a new alert. The status defaults to NEW when not given.
    fn create_alert(&self, draft: &AlertDraft) -> Result<Alert>;

    /// Replaces every client supplied field of the alert.
    /// Returns Ok(None) if the alert does not exist.
    fn update_alert(&self, id: i64, draft: &AlertDraft) -> Result<Option<Alert>>;

    /// Returns Ok(false) if the alert does not exist.
    fn delete_alert(&self, id: i64) -> Result<bool>;

    fn list_alerts_by_severity(&self, severity: &str) -> Result<Vec<Alert>>;

    fn list_alerts_by_status(&self, status: &str) -> Result<Vec<Alert>>;
}
