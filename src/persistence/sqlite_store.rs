//! SQLite implementation of the ActivityStore trait

use super::{ActivityStore, StoreError};
use crate::models::{DeviceInfo, LocationInfo, LoginActivity, LoginMethod, NewLoginActivity};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

const SELECT_COLUMNS: &str = "id, user_id, email, login_method, success, error_message, \
     ip_address, user_agent, session_id, device_info, location, timestamp_ms";

/// SQLite-backed append-only activity log
///
/// Nested `device_info` and `location` values are stored as JSON text
/// columns; every optional field maps to a nullable column so an absent
/// value is always an explicit NULL.
pub struct SqliteActivityStore {
    conn: Mutex<Connection>,
}

impl SqliteActivityStore {
    /// Create a store at the specified path, initializing the schema.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        let store = SqliteActivityStore {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (useful for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = SqliteActivityStore {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    fn to_activity(raw: RawRow) -> Result<LoginActivity, StoreError> {
        let login_method: LoginMethod = raw
            .login_method
            .parse()
            .map_err(|_| StoreError::InvalidData(format!("login method: {}", raw.login_method)))?;
        let device_info: Option<DeviceInfo> = raw
            .device_info
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        let location: Option<LocationInfo> = raw
            .location
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(LoginActivity {
            id: Some(raw.id.to_string()),
            user_id: raw.user_id,
            email: raw.email,
            login_method,
            success: raw.success,
            error_message: raw.error_message,
            ip_address: raw.ip_address,
            user_agent: raw.user_agent,
            session_id: raw.session_id,
            device_info,
            location,
            timestamp: raw.timestamp_ms,
        })
    }

    fn fetch(&self, sql: &str, binding: Option<&str>, limit: usize) -> Result<Vec<LoginActivity>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(sql)?;

        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<RawRow> {
            Ok(RawRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                email: row.get(2)?,
                login_method: row.get(3)?,
                success: row.get(4)?,
                error_message: row.get(5)?,
                ip_address: row.get(6)?,
                user_agent: row.get(7)?,
                session_id: row.get(8)?,
                device_info: row.get(9)?,
                location: row.get(10)?,
                timestamp_ms: row.get(11)?,
            })
        };

        let rows = match binding {
            Some(value) => stmt
                .query_map(params![value, limit as i64], map_row)?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt
                .query_map(params![limit as i64], map_row)?
                .collect::<Result<Vec<_>, _>>()?,
        };

        rows.into_iter().map(Self::to_activity).collect()
    }
}

impl ActivityStore for SqliteActivityStore {
    fn record(&self, activity: &NewLoginActivity) -> Result<String, StoreError> {
        let device_info = activity
            .device_info
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let location = activity
            .location
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        // Timestamp is assigned here, at the storage layer.
        let timestamp_ms = Utc::now().timestamp_millis();

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO login_activities
             (user_id, email, login_method, success, error_message,
              ip_address, user_agent, session_id, device_info, location, timestamp_ms)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                activity.user_id,
                activity.email,
                activity.login_method.as_str(),
                activity.success,
                activity.error_message,
                activity.ip_address,
                activity.user_agent,
                activity.session_id,
                device_info,
                location,
                timestamp_ms
            ],
        )?;

        Ok(conn.last_insert_rowid().to_string())
    }

    fn by_user(&self, user_id: &str, limit: usize) -> Result<Vec<LoginActivity>, StoreError> {
        let sql = format!(
            "SELECT {} FROM login_activities WHERE user_id = ? LIMIT ?",
            SELECT_COLUMNS
        );
        self.fetch(&sql, Some(user_id), limit)
    }

    fn recent(&self, limit: usize) -> Result<Vec<LoginActivity>, StoreError> {
        let sql = format!("SELECT {} FROM login_activities LIMIT ?", SELECT_COLUMNS);
        self.fetch(&sql, None, limit)
    }
}

/// Columns as read from SQLite, before JSON/enum decoding.
struct RawRow {
    id: i64,
    user_id: String,
    email: String,
    login_method: String,
    success: bool,
    error_message: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    session_id: Option<String>,
    device_info: Option<String>,
    location: Option<String>,
    timestamp_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNKNOWN;

    fn create_test_store() -> SqliteActivityStore {
        SqliteActivityStore::in_memory().expect("Failed to create in-memory store")
    }

    fn sample_activity(user_id: &str, success: bool) -> NewLoginActivity {
        NewLoginActivity {
            user_id: user_id.to_string(),
            email: format!("{}@example.com", user_id),
            login_method: LoginMethod::Email,
            success,
            error_message: if success {
                None
            } else {
                Some("invalid credentials".to_string())
            },
            ip_address: Some("203.0.113.9".to_string()),
            user_agent: Some("Mozilla/5.0 (Windows NT 10.0) Chrome/120.0".to_string()),
            session_id: Some("session_1700000000000_abc123def".to_string()),
            device_info: Some(DeviceInfo {
                platform: "Windows".to_string(),
                browser: "Chrome".to_string(),
                version: "120.0".to_string(),
            }),
            location: Some(LocationInfo {
                ip: "203.0.113.9".to_string(),
                country: "Germany".to_string(),
                city: "Berlin".to_string(),
                region: "Berlin".to_string(),
                timezone: "Europe/Berlin".to_string(),
                latitude: Some(52.52),
                longitude: Some(13.405),
                accuracy: None,
            }),
        }
    }

    #[test]
    fn test_record_returns_assigned_id() {
        let store = create_test_store();
        let id = store.record(&sample_activity("u1", true)).unwrap();
        assert!(!id.is_empty());
        let second = store.record(&sample_activity("u1", true)).unwrap();
        assert_ne!(id, second);
    }

    #[test]
    fn test_record_roundtrip_preserves_fields() {
        let store = create_test_store();
        let input = sample_activity("u1", true);
        let id = store.record(&input).unwrap();

        let read = store.recent(10).unwrap();
        assert_eq!(read.len(), 1);
        let activity = &read[0];

        // Identical except id and timestamp, which the store assigns.
        assert_eq!(activity.id.as_deref(), Some(id.as_str()));
        assert!(activity.timestamp > 0);
        assert_eq!(activity.user_id, input.user_id);
        assert_eq!(activity.email, input.email);
        assert_eq!(activity.login_method, input.login_method);
        assert_eq!(activity.success, input.success);
        assert_eq!(activity.error_message, input.error_message);
        assert_eq!(activity.ip_address, input.ip_address);
        assert_eq!(activity.user_agent, input.user_agent);
        assert_eq!(activity.session_id, input.session_id);
        assert_eq!(activity.device_info, input.device_info);
        assert_eq!(activity.location, input.location);
    }

    #[test]
    fn test_absent_optionals_stored_as_explicit_null() {
        let store = create_test_store();
        store
            .record(&NewLoginActivity {
                user_id: String::new(),
                email: "nobody@example.com".to_string(),
                login_method: LoginMethod::Google,
                success: false,
                error_message: None,
                ip_address: None,
                user_agent: None,
                session_id: None,
                device_info: None,
                location: None,
            })
            .unwrap();

        // Inspect the raw row: every optional column must be NULL.
        let conn = store.conn.lock().unwrap();
        let nulls: i64 = conn
            .query_row(
                "SELECT (error_message IS NULL) + (ip_address IS NULL)
                      + (user_agent IS NULL) + (session_id IS NULL)
                      + (device_info IS NULL) + (location IS NULL)
                 FROM login_activities",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(nulls, 6);
        drop(conn);

        let read = store.recent(1).unwrap();
        assert!(read[0].error_message.is_none());
        assert!(read[0].device_info.is_none());
        assert!(read[0].location.is_none());
    }

    #[test]
    fn test_by_user_filters_and_limits() {
        let store = create_test_store();
        for _ in 0..8 {
            store.record(&sample_activity("target", true)).unwrap();
        }
        store.record(&sample_activity("other", true)).unwrap();

        let rows = store.by_user("target", 5).unwrap();
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|a| a.user_id == "target"));
    }

    #[test]
    fn test_recent_respects_limit() {
        let store = create_test_store();
        for i in 0..4 {
            store
                .record(&sample_activity(&format!("u{}", i), i % 2 == 0))
                .unwrap();
        }
        assert_eq!(store.recent(2).unwrap().len(), 2);
        assert_eq!(store.recent(10).unwrap().len(), 4);
    }

    #[test]
    fn test_unknown_sentinels_survive_storage() {
        let store = create_test_store();
        let mut input = sample_activity("u1", true);
        input.location = Some(LocationInfo::default());
        store.record(&input).unwrap();

        let read = store.recent(1).unwrap();
        let location = read[0].location.as_ref().unwrap();
        assert_eq!(location.ip, UNKNOWN);
        assert_eq!(location.city, UNKNOWN);
        assert!(location.latitude.is_none());
    }

    #[test]
    fn test_on_disk_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activities.db");

        let store = SqliteActivityStore::new(&path).unwrap();
        store.record(&sample_activity("u1", true)).unwrap();
        drop(store);

        // Reopen and verify the record persisted.
        let reopened = SqliteActivityStore::new(&path).unwrap();
        assert_eq!(reopened.recent(10).unwrap().len(), 1);
    }
}
