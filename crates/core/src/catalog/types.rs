//! Types for the torrent catalog.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::{InfoHash, TorrentSpec};

/// A persisted catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Info hash (lowercase hex).
    pub hash: InfoHash,
    pub title: String,
    pub poster: String,
    pub data: String,
    /// Total size in bytes (0 if unknown).
    pub size: u64,
    /// Insertion/update time (unix seconds).
    pub timestamp: i64,
    /// Descriptor needed to re-create the live session. `None` marks a dead
    /// entry that can be listed but never hydrated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<TorrentSpec>,
}

impl CatalogRecord {
    /// Catalog entry with only a hash and a spec.
    pub fn new(spec: TorrentSpec) -> Self {
        Self {
            hash: spec.info_hash.clone(),
            title: String::new(),
            poster: String::new(),
            data: String::new(),
            size: 0,
            timestamp: 0,
            spec: Some(spec),
        }
    }

    pub fn can_hydrate(&self) -> bool {
        self.spec.is_some()
    }
}

/// Errors for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Catalog is closed")]
    Closed,

    #[error("Internal error: {0}")]
    Internal(String),
}
