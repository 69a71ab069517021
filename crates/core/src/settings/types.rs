//! Runtime swarm settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 1 MiB in bytes.
pub const MIB: i64 = 1024 * 1024;

/// Runtime BitTorrent settings.
///
/// These are changed while the process runs (through the settings
/// reconfiguration transaction) and persisted in the settings store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BtSettings {
    /// Keep downloaded pieces on disk under `cache_directory/<hash>`.
    pub use_disk_cache: bool,
    /// Root directory of the on-disk cache.
    pub cache_directory: PathBuf,
    /// Piece cache capacity in bytes.
    pub cache_capacity_bytes: i64,
    /// Size preloads from the read-ahead percentage instead of the fixed budget.
    pub buffered_preload: bool,
    /// Read-ahead share of the cache, 0-100.
    pub read_ahead_percent: f64,
    /// Enable DHT peer discovery.
    pub enable_dht: bool,
    /// Fixed peer listen port (random if unset).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<u16>,
}

impl Default for BtSettings {
    fn default() -> Self {
        Self {
            use_disk_cache: false,
            cache_directory: PathBuf::from("cache"),
            cache_capacity_bytes: 64 * MIB,
            buffered_preload: false,
            read_ahead_percent: 95.0,
            enable_dht: true,
            listen_port: None,
        }
    }
}

impl BtSettings {
    /// Clamp values into their valid ranges.
    pub fn normalized(mut self) -> Self {
        if !self.read_ahead_percent.is_finite() {
            self.read_ahead_percent = 0.0;
        }
        self.read_ahead_percent = self.read_ahead_percent.clamp(0.0, 100.0);
        self.cache_capacity_bytes = self.cache_capacity_bytes.max(0);
        self
    }
}

/// Errors for settings store operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Settings store is read-only")]
    ReadOnly,

    #[error("Settings store is closed")]
    Closed,
}
