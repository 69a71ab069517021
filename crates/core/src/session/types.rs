//! Types for the swarm session layer.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::live::LiveSession;
use super::spec::{InfoHash, SpecError, TorrentSpec};
use crate::settings::BtSettings;

/// Errors that can occur in the swarm session layer.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid torrent spec: {0}")]
    InvalidSpec(#[from] SpecError),

    #[error("Session manager is disconnected")]
    Disconnected,

    #[error("Failed to add torrent: {0}")]
    AddFailed(String),

    #[error("Torrent not found: {0}")]
    NotFound(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Swarm session manager.
///
/// Owns every live session. Implementations must guarantee at most one
/// session per hash: `create` for a hash that already has a session returns
/// that session.
#[async_trait]
pub trait SessionManager: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Live session for `hash`, if any.
    async fn session_for(&self, hash: &InfoHash) -> Option<Arc<LiveSession>>;

    /// Create (or attach to) the live session for `spec`.
    async fn create(&self, spec: &TorrentSpec) -> Result<Arc<LiveSession>, SessionError>;

    /// Tear down the live session for `hash`.
    ///
    /// Returns `Ok(false)` when there was nothing to tear down.
    async fn destroy(&self, hash: &InfoHash) -> Result<bool, SessionError>;

    /// Stop all network activity and release listening ports.
    async fn disconnect_all(&self) -> Result<(), SessionError>;

    /// Bring the swarm back up using `settings`.
    async fn reconnect_all(&self, settings: &BtSettings) -> Result<(), SessionError>;

    /// Wait until the info dictionary of `handle` is known.
    ///
    /// `true` once known, `false` on permanent failure.
    async fn wait_for_metadata(&self, handle: &LiveSession) -> bool {
        handle.wait_for_metadata().await
    }

    /// Every live session, keyed by hash.
    async fn list_active(&self) -> HashMap<InfoHash, Arc<LiveSession>>;

    /// Warm up to `budget` bytes of file `file_index` into the piece cache.
    ///
    /// Returns the number of bytes actually read ahead.
    async fn preload(
        &self,
        handle: &LiveSession,
        file_index: usize,
        budget: u64,
    ) -> Result<u64, SessionError>;
}
