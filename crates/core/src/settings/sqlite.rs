//! SQLite-backed settings store.

use std::path::Path;
use std::sync::{Mutex, PoisonError, RwLock};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};

use super::{BtSettings, SettingsError, SettingsStore};

const SETTINGS_KEY: &str = "bittorrent";

/// SQLite-backed settings store.
///
/// Keeps the current settings in memory; the database row is only read once
/// at open time.
pub struct SqliteSettingsStore {
    conn: Mutex<Option<Connection>>,
    current: RwLock<BtSettings>,
    read_only: bool,
}

impl SqliteSettingsStore {
    /// Open the settings store, creating the table if needed.
    pub fn new(path: &Path, read_only: bool) -> Result<Self, SettingsError> {
        let conn = Connection::open(path).map_err(|e| SettingsError::Database(e.to_string()))?;
        Self::from_connection(conn, read_only)
    }

    /// Create an in-memory settings store (useful for testing).
    pub fn in_memory(read_only: bool) -> Result<Self, SettingsError> {
        let conn =
            Connection::open_in_memory().map_err(|e| SettingsError::Database(e.to_string()))?;
        Self::from_connection(conn, read_only)
    }

    fn from_connection(conn: Connection, read_only: bool) -> Result<Self, SettingsError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| SettingsError::Database(e.to_string()))?;

        let stored: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                params![SETTINGS_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| SettingsError::Database(e.to_string()))?;

        let current = match stored {
            Some(json) => match serde_json::from_str::<BtSettings>(&json) {
                Ok(settings) => settings.normalized(),
                Err(e) => {
                    warn!(error = %e, "Stored settings are unreadable, using defaults");
                    BtSettings::default()
                }
            },
            None => BtSettings::default(),
        };

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            current: RwLock::new(current),
            read_only,
        })
    }

    fn persist(&self, settings: &BtSettings) -> Result<(), SettingsError> {
        if self.read_only {
            return Err(SettingsError::ReadOnly);
        }

        let json = serde_json::to_string(settings)
            .map_err(|e| SettingsError::Serialization(e.to_string()))?;

        let guard = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let conn = guard.as_ref().ok_or(SettingsError::Closed)?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![SETTINGS_KEY, json],
        )
        .map_err(|e| SettingsError::Database(e.to_string()))?;

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = settings.clone();
        Ok(())
    }
}

impl SettingsStore for SqliteSettingsStore {
    fn current(&self) -> BtSettings {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn save(&self, settings: &BtSettings) -> Result<(), SettingsError> {
        let settings = settings.clone().normalized();
        self.persist(&settings)?;
        info!("Settings saved");
        Ok(())
    }

    fn reset_to_default(&self) -> Result<BtSettings, SettingsError> {
        let defaults = BtSettings::default();
        self.persist(&defaults)?;
        info!("Settings reset to defaults");
        Ok(defaults)
    }

    fn close(&self) -> Result<(), SettingsError> {
        let conn = self
            .conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(conn) = conn {
            conn.close()
                .map_err(|(_, e)| SettingsError::Database(e.to_string()))?;
        }
        Ok(())
    }
}
