use super::alert_store::AlertStore;
use super::models::{Alert, AlertDraft};
use super::schema::ALERT_VERSIONED_SCHEMAS;
use crate::sqlite_persistence::open_versioned_db;
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const ALERT_COLUMNS: &str = "id, title, description, severity, status, source_ip, \
    destination_ip, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteAlertStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAlertStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned_db(db_path, ALERT_VERSIONED_SCHEMAS, "alerts")?;
        Ok(SqliteAlertStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Alerts database mutex poisoned"))
    }

    fn query_alerts(&self, filter: Option<(&str, &str)>) -> Result<Vec<Alert>> {
        let conn = self.lock()?;
        let (where_clause, args): (String, Vec<&dyn ToSql>) = match &filter {
            Some((column, value)) => (format!("WHERE {} = ?1", column), vec![value]),
            None => (String::new(), vec![]),
        };
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM alert {} ORDER BY created_at DESC, id DESC",
            ALERT_COLUMNS, where_clause
        ))?;
        let alerts = stmt
            .query_map(args.as_slice(), row_to_alert)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read alerts")?;
        Ok(alerts)
    }
}

fn row_to_alert(row: &rusqlite::Row) -> rusqlite::Result<Alert> {
    Ok(Alert {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        severity: row.get("severity")?,
        status: row.get("status")?,
        source_ip: row.get("source_ip")?,
        destination_ip: row.get("destination_ip")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn select_alert(conn: &Connection, id: i64) -> Result<Option<Alert>> {
    conn.query_row(
        &format!("SELECT {} FROM alert WHERE id = ?1", ALERT_COLUMNS),
        params![id],
        row_to_alert,
    )
    .optional()
    .with_context(|| format!("Failed to read alert {}", id))
}

impl AlertStore for SqliteAlertStore {
    fn list_alerts(&self) -> Result<Vec<Alert>> {
        self.query_alerts(None)
    }

    fn get_alert(&self, id: i64) -> Result<Option<Alert>> {
        let conn = self.lock()?;
        select_alert(&conn, id)
    }

    fn create_alert(&self, draft: &AlertDraft) -> Result<Alert> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO alert (title, description, severity, status, source_ip, destination_ip) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                draft.title,
                draft.description,
                draft.severity,
                draft.status_or_default(),
                draft.source_ip,
                draft.destination_ip,
            ],
        )
        .context("Failed to insert alert")?;
        let id = conn.last_insert_rowid();
        select_alert(&conn, id)?.with_context(|| format!("Alert {} missing after insert", id))
    }

    fn update_alert(&self, id: i64, draft: &AlertDraft) -> Result<Option<Alert>> {
        let conn = self.lock()?;
        let updated = conn
            .execute(
                "UPDATE alert SET title = ?1, description = ?2, severity = ?3, status = ?4, \
                     source_ip = ?5, destination_ip = ?6, \
                     updated_at = cast(strftime('%s','now') as int) \
                 WHERE id = ?7",
                params![
                    draft.title,
                    draft.description,
                    draft.severity,
                    draft.status_or_default(),
                    draft.source_ip,
                    draft.destination_ip,
                    id,
                ],
            )
            .with_context(|| format!("Failed to update alert {}", id))?;
        if updated == 0 {
            return Ok(None);
        }
        select_alert(&conn, id)
    }

    fn delete_alert(&self, id: i64) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn
            .execute("DELETE FROM alert WHERE id = ?1", params![id])
            .with_context(|| format!("Failed to delete alert {}", id))?;
        Ok(deleted > 0)
    }

    fn list_alerts_by_severity(&self, severity: &str) -> Result<Vec<Alert>> {
        self.query_alerts(Some(("severity", severity)))
    }

    fn list_alerts_by_status(&self, status: &str) -> Result<Vec<Alert>> {
        self.query_alerts(Some(("status", status)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_tmp_store() -> (SqliteAlertStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteAlertStore::new(temp_dir.path().join("alerts.db")).unwrap();
        (store, temp_dir)
    }

    fn draft(title: &str, severity: &str, status: Option<&str>) -> AlertDraft {
        AlertDraft {
            title: title.to_string(),
            description: Some(format!("{} details", title)),
            severity: severity.to_string(),
            status: status.map(str::to_string),
            source_ip: Some("10.0.0.5".to_string()),
            destination_ip: Some("10.0.0.1".to_string()),
        }
    }

    #[test]
    fn creates_alert_with_default_status() {
        let (store, _dir) = create_tmp_store();

        let alert = store.create_alert(&draft("Port scan", "HIGH", None)).unwrap();

        assert_eq!(alert.title, "Port scan");
        assert_eq!(alert.status, "NEW");
        assert_eq!(alert.source_ip.as_deref(), Some("10.0.0.5"));
        assert!(alert.created_at > 0);
        assert_eq!(store.get_alert(alert.id).unwrap(), Some(alert));
    }

    #[test]
    fn updates_and_deletes_alert() {
        let (store, _dir) = create_tmp_store();
        let alert = store.create_alert(&draft("Port scan", "HIGH", None)).unwrap();

        let updated = store
            .update_alert(alert.id, &draft("Port scan", "LOW", Some("RESOLVED")))
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, alert.id);
        assert_eq!(updated.severity, "LOW");
        assert_eq!(updated.status, "RESOLVED");
        assert_eq!(updated.created_at, alert.created_at);

        assert!(store.delete_alert(alert.id).unwrap());
        assert!(!store.delete_alert(alert.id).unwrap());
        assert!(store.get_alert(alert.id).unwrap().is_none());
    }

    #[test]
    fn missing_alert_is_not_updated() {
        let (store, _dir) = create_tmp_store();
        assert!(store
            .update_alert(42, &draft("x", "LOW", None))
            .unwrap()
            .is_none());
    }

    #[test]
    fn filters_by_severity_and_status() {
        let (store, _dir) = create_tmp_store();
        store.create_alert(&draft("a", "HIGH", None)).unwrap();
        store
            .create_alert(&draft("b", "HIGH", Some("INVESTIGATING")))
            .unwrap();
        store.create_alert(&draft("c", "LOW", None)).unwrap();

        assert_eq!(store.list_alerts().unwrap().len(), 3);
        assert_eq!(store.list_alerts_by_severity("HIGH").unwrap().len(), 2);
        assert_eq!(store.list_alerts_by_severity("CRITICAL").unwrap().len(), 0);

        let new: Vec<String> = store
            .list_alerts_by_status("NEW")
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(new, vec!["c", "a"]);
    }
}
