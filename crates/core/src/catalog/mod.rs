//! Torrent catalog - durable record of every torrent seen.
//!
//! Catalog entries outlive live sessions: they are what lets a torrent be
//! restored after a restart or an idle teardown.

mod sqlite;
mod types;

use std::collections::HashMap;

pub use sqlite::SqliteCatalog;
pub use types::*;

use crate::session::InfoHash;

/// Trait for torrent catalog storage.
pub trait TorrentCatalog: Send + Sync {
    /// Get a specific torrent by hash.
    fn get(&self, hash: &InfoHash) -> Result<Option<CatalogRecord>, CatalogError>;

    /// Insert or replace a record.
    fn put(&self, record: &CatalogRecord) -> Result<(), CatalogError>;

    /// Remove a torrent. Returns whether anything was removed.
    fn delete(&self, hash: &InfoHash) -> Result<bool, CatalogError>;

    /// All records keyed by hash.
    fn list_all(&self) -> Result<HashMap<InfoHash, CatalogRecord>, CatalogError>;

    /// Release the underlying storage. Every later call fails with `Closed`.
    fn close(&self) -> Result<(), CatalogError>;
}
