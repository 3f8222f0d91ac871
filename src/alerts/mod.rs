//! Security alert tracking (`alerts.db`).

mod alert_store;
mod models;
mod schema;
mod sqlite_alert_store;

pub use alert_store::AlertStore;
pub use models::{Alert, AlertDraft, DEFAULT_ALERT_STATUS};
pub use sqlite_alert_store::SqliteAlertStore;
