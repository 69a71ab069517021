//! Caller-visible torrent records and engine errors.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{CatalogError, CatalogRecord};
use crate::session::{InfoHash, LiveSession, MetadataState, SessionError, TorrentSpec};
use crate::settings::SettingsError;

use super::connection::ConnectionState;

/// Which source(s) a record was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    /// Live session only, not in the catalog.
    Live,
    /// Catalog-backed stand-in; no live session yet.
    Catalog,
    /// Live session with catalog metadata merged into blank fields.
    Merged,
}

/// Metadata status of the record's live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Catalog stand-in, nothing is running.
    Stored,
    /// Live session still fetching its info dictionary.
    GettingInfo,
    /// Live session with known info dictionary.
    Ready,
    /// Live session whose metadata can no longer be fetched.
    Failed,
}

/// The unified torrent entity returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct TorrentRecord {
    pub hash: InfoHash,
    pub title: String,
    pub poster: String,
    pub data: String,
    pub size: u64,
    pub timestamp: i64,
    pub source: RecordSource,
    pub status: RecordStatus,
    /// Name embedded in the torrent metadata, once known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip)]
    pub spec: Option<TorrentSpec>,
    #[serde(skip)]
    pub session: Option<Arc<LiveSession>>,
}

impl TorrentRecord {
    fn from_live(live: &Arc<LiveSession>) -> Self {
        let meta = live.metadata();
        let status = match live.metadata_state() {
            MetadataState::Pending => RecordStatus::GettingInfo,
            MetadataState::Ready(_) => RecordStatus::Ready,
            MetadataState::Failed(_) => RecordStatus::Failed,
        };
        Self {
            hash: live.hash().clone(),
            title: meta.title,
            poster: meta.poster,
            data: meta.data,
            size: meta.size,
            timestamp: meta.timestamp,
            source: RecordSource::Live,
            status,
            name: live.info_name(),
            spec: Some(live.spec().clone()),
            session: Some(Arc::clone(live)),
        }
    }

    fn from_catalog(entry: CatalogRecord) -> Self {
        Self {
            hash: entry.hash,
            title: entry.title,
            poster: entry.poster,
            data: entry.data,
            size: entry.size,
            timestamp: entry.timestamp,
            source: RecordSource::Catalog,
            status: RecordStatus::Stored,
            name: None,
            spec: entry.spec,
            session: None,
        }
    }

    /// Whether a live session backs this record.
    pub fn is_live(&self) -> bool {
        self.session.is_some()
    }

    /// Total order used by listings: newest first, then title descending,
    /// then hash descending so distinct records never compare equal.
    pub fn listing_order(a: &TorrentRecord, b: &TorrentRecord) -> Ordering {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| b.title.cmp(&a.title))
            .then_with(|| b.hash.cmp(&a.hash))
    }
}

/// Precedence between the two sources of truth for one hash.
#[derive(Debug, Clone)]
pub enum Resolved {
    LiveOnly(Arc<LiveSession>),
    CatalogOnly(CatalogRecord),
    Both(Arc<LiveSession>, CatalogRecord),
}

impl Resolved {
    /// Pair up whatever exists for a hash. `None` when neither does.
    pub fn from_parts(
        live: Option<Arc<LiveSession>>,
        stored: Option<CatalogRecord>,
    ) -> Option<Self> {
        match (live, stored) {
            (Some(live), Some(stored)) => Some(Resolved::Both(live, stored)),
            (Some(live), None) => Some(Resolved::LiveOnly(live)),
            (None, Some(stored)) => Some(Resolved::CatalogOnly(stored)),
            (None, None) => None,
        }
    }

    /// Produce the single authoritative record.
    ///
    /// The live session wins; catalog values only fill fields that are blank
    /// on the live side.
    pub fn merge(self) -> TorrentRecord {
        match self {
            Resolved::LiveOnly(live) => TorrentRecord::from_live(&live),
            Resolved::CatalogOnly(stored) => TorrentRecord::from_catalog(stored),
            Resolved::Both(live, stored) => {
                let mut record = TorrentRecord::from_live(&live);
                fill_blank(&mut record.title, stored.title);
                fill_blank(&mut record.poster, stored.poster);
                fill_blank(&mut record.data, stored.data);
                if record.size == 0 {
                    record.size = stored.size;
                }
                if record.timestamp == 0 {
                    record.timestamp = stored.timestamp;
                }
                record.source = RecordSource::Merged;
                record
            }
        }
    }
}

fn fill_blank(field: &mut String, fallback: String) {
    if field.is_empty() {
        *field = fallback;
    }
}

/// Outcome of a settings reconfiguration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsOutcome {
    /// Settings persisted and the swarm reconnected.
    Applied,
    /// Settings store is read-only; nothing was touched.
    ReadOnly,
}

/// Point-in-time summary of the engine.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub accepting: bool,
    pub connection: ConnectionState,
    /// Live sessions, by metadata status.
    pub live_sessions: usize,
    pub getting_info: usize,
    pub ready: usize,
    pub failed: usize,
    pub catalog_entries: usize,
    pub pending_hydrations: usize,
    pub settings_read_only: bool,
}

/// Errors returned by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("Torrent not found: {0}")]
    NotFound(String),

    #[error("Engine is shutting down")]
    ShuttingDown,
}
