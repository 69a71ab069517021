//! Live session handle shared between the swarm backend and the engine.

use std::sync::{Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::spec::{InfoHash, TorrentSpec};

/// User-visible metadata carried by a live session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub title: String,
    pub poster: String,
    pub data: String,
    /// Total size in bytes (0 until known).
    pub size: u64,
    /// Catalog insertion/update time (unix seconds, 0 if never saved).
    pub timestamp: i64,
}

/// Info dictionary facts known once metadata resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentInfo {
    /// Name embedded in the torrent's info dictionary.
    pub name: String,
    pub size_bytes: u64,
}

/// Metadata resolution state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataState {
    /// Still fetching the info dictionary from peers.
    Pending,
    Ready(TorrentInfo),
    /// Permanent failure (bad spec, backend gone).
    Failed(String),
}

/// A live torrent session.
///
/// Owned by the session manager; everyone else holds an `Arc` to it. All
/// mutable state uses interior locking so the handle can be shared freely.
#[derive(Debug)]
pub struct LiveSession {
    hash: InfoHash,
    spec: TorrentSpec,
    metadata: RwLock<SessionMetadata>,
    info: watch::Sender<MetadataState>,
    expires_at: Mutex<Option<DateTime<Utc>>>,
}

impl LiveSession {
    /// Create a session handle whose metadata is still pending.
    pub fn new(spec: TorrentSpec) -> Self {
        let (info, _) = watch::channel(MetadataState::Pending);
        Self {
            hash: spec.info_hash.clone(),
            spec,
            metadata: RwLock::new(SessionMetadata::default()),
            info,
            expires_at: Mutex::new(None),
        }
    }

    pub fn hash(&self) -> &InfoHash {
        &self.hash
    }

    pub fn spec(&self) -> &TorrentSpec {
        &self.spec
    }

    /// Snapshot of the user-visible metadata.
    pub fn metadata(&self) -> SessionMetadata {
        self.metadata
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mutate the user-visible metadata in place.
    pub fn update_metadata<F>(&self, f: F)
    where
        F: FnOnce(&mut SessionMetadata),
    {
        let mut guard = self
            .metadata
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }

    /// Current metadata resolution state.
    pub fn metadata_state(&self) -> MetadataState {
        self.info.borrow().clone()
    }

    /// Info dictionary, if already known.
    pub fn info(&self) -> Option<TorrentInfo> {
        match &*self.info.borrow() {
            MetadataState::Ready(info) => Some(info.clone()),
            _ => None,
        }
    }

    /// Embedded torrent name, if already known.
    pub fn info_name(&self) -> Option<String> {
        self.info().map(|i| i.name).filter(|n| !n.is_empty())
    }

    pub fn has_info(&self) -> bool {
        matches!(*self.info.borrow(), MetadataState::Ready(_))
    }

    /// Record that the info dictionary is known.
    ///
    /// The size is copied onto the metadata if it was still unknown.
    pub fn mark_ready(&self, info: TorrentInfo) {
        let size = info.size_bytes;
        self.update_metadata(|m| {
            if m.size == 0 {
                m.size = size;
            }
        });
        self.info.send_replace(MetadataState::Ready(info));
    }

    /// Record a permanent metadata failure. No-op once ready.
    pub fn mark_failed(&self, reason: impl Into<String>) {
        let reason = reason.into();
        self.info.send_if_modified(|state| match state {
            MetadataState::Ready(_) => false,
            _ => {
                *state = MetadataState::Failed(reason);
                true
            }
        });
    }

    /// Wait until the info dictionary is known.
    ///
    /// Returns `true` once ready and `false` on permanent failure.
    pub async fn wait_for_metadata(&self) -> bool {
        let mut rx = self.info.subscribe();
        let ready = match rx
            .wait_for(|state| !matches!(state, MetadataState::Pending))
            .await
        {
            Ok(state) => matches!(*state, MetadataState::Ready(_)),
            Err(_) => false,
        };
        ready
    }

    /// Push the idle-expiry deadline out to `deadline`.
    pub fn touch(&self, deadline: DateTime<Utc>) {
        *self
            .expires_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(deadline);
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        *self
            .expires_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the session has been idle past its deadline.
    ///
    /// Sessions that were never given a deadline do not expire.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|deadline| deadline <= now)
    }
}
