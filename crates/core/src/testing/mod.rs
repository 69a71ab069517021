//! Testing utilities and mock implementations.
//!
//! Provides an in-memory swarm backend and a controllable clock so the
//! engine can be exercised without network access or real time passing.
//!
//! # Example
//!
//! ```rust,ignore
//! use torrhub_core::testing::{fixtures, ManualClock, MockSessionManager};
//!
//! let sessions = Arc::new(MockSessionManager::new());
//! let clock = Arc::new(ManualClock::new());
//!
//! sessions.set_torrent_info(&fixtures::hash(fixtures::HASH_A), "Name", 1024).await;
//! clock.advance(chrono::Duration::seconds(61));
//! ```

mod manual_clock;
mod mock_session_manager;

pub use manual_clock::ManualClock;
pub use mock_session_manager::{MockSessionManager, RecordedPreload};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::CatalogRecord;
    use crate::session::{InfoHash, TorrentSpec};

    pub const HASH_A: &str = "a94a8fe5ccb19ba61c4c0873d391e987982fbbd3";
    pub const HASH_B: &str = "0beec7b5ea3f0fdbc95d0dd47f3c5bc275da8a33";
    pub const HASH_C: &str = "62cdb7020ff920e5aa642c3d4066950dd1f01f4d";

    /// Parse a hash constant.
    pub fn hash(hex: &str) -> InfoHash {
        InfoHash::parse(hex).expect("fixture hash is valid")
    }

    /// Magnet spec for a hash.
    pub fn spec(hex: &str) -> TorrentSpec {
        TorrentSpec::parse_link(hex).expect("fixture hash is valid")
    }

    /// Magnet spec carrying a display name.
    pub fn named_spec(hex: &str, name: &str) -> TorrentSpec {
        let magnet = format!(
            "magnet:?xt=urn:btih:{}&dn={}",
            hex,
            urlencoding::encode(name)
        );
        TorrentSpec::from_magnet(&magnet).expect("fixture magnet is valid")
    }

    /// Catalog entry with metadata.
    pub fn catalog_record(
        hex: &str,
        title: &str,
        poster: &str,
        data: &str,
        timestamp: i64,
    ) -> CatalogRecord {
        CatalogRecord {
            title: title.to_string(),
            poster: poster.to_string(),
            data: data.to_string(),
            size: 1024,
            timestamp,
            ..CatalogRecord::new(spec(hex))
        }
    }

    /// Catalog entry that has lost its spec.
    pub fn dead_record(hex: &str, title: &str, timestamp: i64) -> CatalogRecord {
        CatalogRecord {
            hash: hash(hex),
            title: title.to_string(),
            poster: String::new(),
            data: String::new(),
            size: 0,
            timestamp,
            spec: None,
        }
    }
}
