//! SQLite-backed torrent catalog implementation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use super::{CatalogError, CatalogRecord, TorrentCatalog};
use crate::session::{InfoHash, SpecSource, TorrentSpec};

/// SQLite-backed torrent catalog.
///
/// Writes are serialized through the connection mutex.
pub struct SqliteCatalog {
    conn: Mutex<Option<Connection>>,
}

/// Raw row before the hash and spec are validated.
struct CatalogRow {
    hash: String,
    title: String,
    poster: String,
    data: String,
    size: i64,
    timestamp: i64,
    spec_kind: Option<String>,
    spec_payload: Option<Vec<u8>>,
}

impl SqliteCatalog {
    /// Create a new SQLite catalog, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path).map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Create an in-memory SQLite catalog (useful for testing).
    pub fn in_memory() -> Result<Self, CatalogError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(
            r#"
            -- One row per unique info hash
            CREATE TABLE IF NOT EXISTS torrents (
                hash TEXT PRIMARY KEY,
                title TEXT NOT NULL DEFAULT '',
                poster TEXT NOT NULL DEFAULT '',
                data TEXT NOT NULL DEFAULT '',
                size INTEGER NOT NULL DEFAULT 0,
                timestamp INTEGER NOT NULL DEFAULT 0,
                spec_kind TEXT,
                spec_payload BLOB
            );

            CREATE INDEX IF NOT EXISTS idx_torrents_timestamp ON torrents(timestamp);
            "#,
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_row(row: &rusqlite::Row) -> rusqlite::Result<CatalogRow> {
        Ok(CatalogRow {
            hash: row.get(0)?,
            title: row.get(1)?,
            poster: row.get(2)?,
            data: row.get(3)?,
            size: row.get(4)?,
            timestamp: row.get(5)?,
            spec_kind: row.get(6)?,
            spec_payload: row.get(7)?,
        })
    }

    /// Validate a raw row. Rows with an unreadable hash are skipped; rows with
    /// an unreadable spec load as dead entries.
    fn into_record(row: CatalogRow) -> Option<CatalogRecord> {
        let hash = match InfoHash::parse(&row.hash) {
            Ok(hash) => hash,
            Err(e) => {
                warn!(hash = %row.hash, error = %e, "Skipping catalog row with invalid hash");
                return None;
            }
        };

        let spec = Self::decode_spec(&hash, row.spec_kind.as_deref(), row.spec_payload);

        Some(CatalogRecord {
            hash,
            title: row.title,
            poster: row.poster,
            data: row.data,
            size: row.size.max(0) as u64,
            timestamp: row.timestamp,
            spec,
        })
    }

    fn decode_spec(
        hash: &InfoHash,
        kind: Option<&str>,
        payload: Option<Vec<u8>>,
    ) -> Option<TorrentSpec> {
        let source = match (kind, payload) {
            (Some("magnet"), Some(payload)) => {
                SpecSource::Magnet(String::from_utf8_lossy(&payload).into_owned())
            }
            (Some("torrent_file"), Some(payload)) => SpecSource::TorrentFile(payload),
            (None, _) | (_, None) => return None,
            (Some(other), _) => {
                warn!(hash = %hash, kind = other, "Unknown spec kind in catalog");
                return None;
            }
        };

        match TorrentSpec::from_source(source) {
            Ok(spec) if &spec.info_hash == hash => Some(spec),
            Ok(spec) => {
                warn!(hash = %hash, spec_hash = %spec.info_hash, "Catalog spec hash mismatch");
                None
            }
            Err(e) => {
                warn!(hash = %hash, error = %e, "Catalog spec is unreadable");
                None
            }
        }
    }

    fn encode_spec(spec: Option<&TorrentSpec>) -> (Option<&'static str>, Option<Vec<u8>>) {
        match spec.map(|s| &s.source) {
            Some(source @ SpecSource::Magnet(uri)) => {
                (Some(source.kind()), Some(uri.as_bytes().to_vec()))
            }
            Some(source @ SpecSource::TorrentFile(bytes)) => {
                (Some(source.kind()), Some(bytes.clone()))
            }
            None => (None, None),
        }
    }
}

impl TorrentCatalog for SqliteCatalog {
    fn get(&self, hash: &InfoHash) -> Result<Option<CatalogRecord>, CatalogError> {
        let guard = self.lock();
        let conn = guard.as_ref().ok_or(CatalogError::Closed)?;

        let row = conn
            .query_row(
                "SELECT hash, title, poster, data, size, timestamp, spec_kind, spec_payload
                 FROM torrents WHERE hash = ?",
                params![hash.as_str()],
                Self::read_row,
            )
            .optional()
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(row.and_then(Self::into_record))
    }

    fn put(&self, record: &CatalogRecord) -> Result<(), CatalogError> {
        let guard = self.lock();
        let conn = guard.as_ref().ok_or(CatalogError::Closed)?;

        let (spec_kind, spec_payload) = Self::encode_spec(record.spec.as_ref());
        let size = i64::try_from(record.size)
            .map_err(|_| CatalogError::Internal(format!("size out of range: {}", record.size)))?;

        conn.execute(
            "INSERT INTO torrents (hash, title, poster, data, size, timestamp, spec_kind, spec_payload)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(hash) DO UPDATE SET
                title = excluded.title,
                poster = excluded.poster,
                data = excluded.data,
                size = excluded.size,
                timestamp = excluded.timestamp,
                spec_kind = COALESCE(excluded.spec_kind, spec_kind),
                spec_payload = COALESCE(excluded.spec_payload, spec_payload)",
            params![
                record.hash.as_str(),
                &record.title,
                &record.poster,
                &record.data,
                size,
                record.timestamp,
                spec_kind,
                spec_payload,
            ],
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(())
    }

    fn delete(&self, hash: &InfoHash) -> Result<bool, CatalogError> {
        let guard = self.lock();
        let conn = guard.as_ref().ok_or(CatalogError::Closed)?;

        let rows = conn
            .execute("DELETE FROM torrents WHERE hash = ?", params![hash.as_str()])
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(rows > 0)
    }

    fn list_all(&self) -> Result<HashMap<InfoHash, CatalogRecord>, CatalogError> {
        let guard = self.lock();
        let conn = guard.as_ref().ok_or(CatalogError::Closed)?;

        let mut stmt = conn
            .prepare(
                "SELECT hash, title, poster, data, size, timestamp, spec_kind, spec_payload
                 FROM torrents",
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::read_row)
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut records = HashMap::new();
        for row in rows {
            let row = row.map_err(|e| CatalogError::Database(e.to_string()))?;
            if let Some(record) = Self::into_record(row) {
                records.insert(record.hash.clone(), record);
            }
        }
        Ok(records)
    }

    fn close(&self) -> Result<(), CatalogError> {
        let conn = self.lock().take();
        if let Some(conn) = conn {
            conn.close()
                .map_err(|(_, e)| CatalogError::Database(e.to_string()))?;
        }
        Ok(())
    }
}
