//! librqbit embedded session manager implementation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use librqbit::{
    AddTorrent as RqbitAddTorrent, AddTorrentOptions, AddTorrentResponse, ManagedTorrent, Session,
    SessionOptions,
};
use tokio::io::AsyncReadExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{
    InfoHash, LiveSession, SessionError, SessionManager, SessionRegistry, SpecSource, TorrentInfo,
    TorrentSpec,
};
use crate::settings::BtSettings;

/// A running librqbit session and the directory it stores torrents under.
#[derive(Clone)]
struct Connected {
    session: Arc<Session>,
    cache_directory: PathBuf,
}

/// Embedded librqbit session manager.
///
/// Live session handles are registered synchronously in `create`; the
/// librqbit add (which resolves magnet metadata from peers) runs in a spawned
/// task that marks the handle ready or failed.
pub struct LibrqbitSessionManager {
    session: Arc<RwLock<Option<Connected>>>,
    registry: Arc<SessionRegistry>,
    torrents: Arc<RwLock<HashMap<InfoHash, Arc<ManagedTorrent>>>>,
    metadata_timeout: Duration,
}

impl LibrqbitSessionManager {
    /// Create a connected session manager from settings.
    pub async fn new(
        settings: &BtSettings,
        metadata_timeout: Duration,
    ) -> Result<Self, SessionError> {
        let connected = Self::build_session(settings).await?;
        Ok(Self {
            session: Arc::new(RwLock::new(Some(connected))),
            registry: Arc::new(SessionRegistry::new()),
            torrents: Arc::new(RwLock::new(HashMap::new())),
            metadata_timeout,
        })
    }

    async fn build_session(settings: &BtSettings) -> Result<Connected, SessionError> {
        let download_path = PathBuf::from(&settings.cache_directory);

        if !download_path.exists() {
            std::fs::create_dir_all(&download_path).map_err(|e| {
                SessionError::ConnectionFailed(format!(
                    "Failed to create cache directory: {}",
                    e
                ))
            })?;
        }

        let mut opts = SessionOptions::default();

        if !settings.enable_dht {
            opts.disable_dht = true;
        }

        // Range, not RangeInclusive
        if let Some(port) = settings.listen_port {
            opts.listen_port_range = Some(port..(port + 1));
        }

        info!(
            cache_directory = %download_path.display(),
            dht_enabled = !opts.disable_dht,
            "Initializing librqbit session"
        );

        let session = Session::new_with_opts(download_path.clone(), opts)
            .await
            .map_err(|e| {
                SessionError::ConnectionFailed(format!(
                    "Failed to initialize librqbit session: {}",
                    e
                ))
            })?;

        if let Some(port) = session.tcp_listen_port() {
            info!(port = port, "librqbit listening on TCP port");
        }

        Ok(Connected {
            session,
            cache_directory: download_path,
        })
    }

    async fn current_session(&self) -> Result<Connected, SessionError> {
        self.session
            .read()
            .await
            .clone()
            .ok_or(SessionError::Disconnected)
    }

    /// Add the torrent to librqbit and publish the outcome on the handle.
    async fn resolve(
        connected: Connected,
        live: Arc<LiveSession>,
        registry: Arc<SessionRegistry>,
        torrents: Arc<RwLock<HashMap<InfoHash, Arc<ManagedTorrent>>>>,
        metadata_timeout: Duration,
    ) {
        let Connected {
            session,
            cache_directory,
        } = connected;
        let hash = live.hash().clone();
        let spec = live.spec().clone();

        let add_torrent = match &spec.source {
            SpecSource::Magnet(uri) => RqbitAddTorrent::from_url(uri.as_str()),
            SpecSource::TorrentFile(bytes) => RqbitAddTorrent::from_bytes(bytes.clone()),
        };

        let opts = AddTorrentOptions {
            output_folder: Some(cache_directory.join(hash.as_str()).display().to_string()),
            ..Default::default()
        };

        // DHT lookup can take forever for rare torrents
        let added =
            tokio::time::timeout(metadata_timeout, session.add_torrent(add_torrent, Some(opts)))
                .await;

        let handle = match added {
            Ok(Ok(AddTorrentResponse::Added(_, handle)))
            | Ok(Ok(AddTorrentResponse::AlreadyManaged(_, handle))) => handle,
            Ok(Ok(AddTorrentResponse::ListOnly(_))) => {
                Self::fail(&live, &registry, "torrent was added in list-only mode");
                return;
            }
            Ok(Err(e)) => {
                Self::fail(&live, &registry, format!("failed to add torrent: {}", e));
                return;
            }
            Err(_) => {
                Self::fail(&live, &registry, "timed out waiting for torrent metadata");
                return;
            }
        };

        // Torn down while librqbit was resolving
        if !matches!(registry.get(&hash), Some(current) if Arc::ptr_eq(&current, &live)) {
            debug!(hash = %hash, "Session was destroyed before metadata resolved");
            if let Err(e) = session.delete(handle.id().into(), false).await {
                warn!(hash = %hash, error = %e, "Failed to drop orphaned torrent");
            }
            return;
        }

        let name = handle
            .name()
            .map(|s| s.to_string())
            .or_else(|| spec.display_name.clone())
            .unwrap_or_default();
        let size_bytes = handle.stats().total_bytes;

        torrents.write().await.insert(hash.clone(), handle);
        live.mark_ready(TorrentInfo { name, size_bytes });

        debug!(hash = %hash, size_bytes = size_bytes, "Torrent metadata resolved");
    }

    fn fail(live: &Arc<LiveSession>, registry: &SessionRegistry, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(hash = %live.hash(), reason = %reason, "Torrent session failed");
        live.mark_failed(reason);
        registry.remove_if_same(live.hash(), live);
    }

    async fn drop_torrent(
        &self,
        session: &Arc<Session>,
        hash: &InfoHash,
    ) -> Result<(), SessionError> {
        let handle = self.torrents.write().await.remove(hash);
        if let Some(handle) = handle {
            session
                .delete(handle.id().into(), false)
                .await
                .map_err(|e| {
                    SessionError::Internal(format!("Failed to remove torrent: {}", e))
                })?;
        }
        Ok(())
    }
}

#[async_trait]
impl SessionManager for LibrqbitSessionManager {
    fn name(&self) -> &str {
        "librqbit"
    }

    async fn session_for(&self, hash: &InfoHash) -> Option<Arc<LiveSession>> {
        self.registry.get(hash)
    }

    async fn create(&self, spec: &TorrentSpec) -> Result<Arc<LiveSession>, SessionError> {
        let connected = self.current_session().await?;

        let (live, created) = self.registry.get_or_insert(spec);
        if created {
            debug!(hash = %spec.info_hash, source = spec.source.kind(), "Creating torrent session");
            tokio::spawn(Self::resolve(
                connected,
                Arc::clone(&live),
                Arc::clone(&self.registry),
                Arc::clone(&self.torrents),
                self.metadata_timeout,
            ));
        }

        Ok(live)
    }

    async fn destroy(&self, hash: &InfoHash) -> Result<bool, SessionError> {
        let Some(live) = self.registry.remove(hash) else {
            return Ok(false);
        };
        live.mark_failed("session destroyed");

        if let Ok(connected) = self.current_session().await {
            self.drop_torrent(&connected.session, hash).await?;
        }

        debug!(hash = %hash, "Torrent session destroyed");
        Ok(true)
    }

    async fn disconnect_all(&self) -> Result<(), SessionError> {
        let session = self.session.write().await.take();

        for live in self.registry.drain() {
            live.mark_failed("session manager disconnected");
        }

        let handles: Vec<_> = self.torrents.write().await.drain().collect();

        if let Some(Connected { session, .. }) = session {
            for (hash, handle) in handles {
                if let Err(e) = session.delete(handle.id().into(), false).await {
                    warn!(hash = %hash, error = %e, "Failed to remove torrent on disconnect");
                }
            }
            info!("librqbit session disconnected");
        }

        Ok(())
    }

    async fn reconnect_all(&self, settings: &BtSettings) -> Result<(), SessionError> {
        let mut slot = self.session.write().await;
        if slot.is_some() {
            return Ok(());
        }
        *slot = Some(Self::build_session(settings).await?);
        info!("librqbit session reconnected");
        Ok(())
    }

    async fn list_active(&self) -> HashMap<InfoHash, Arc<LiveSession>> {
        self.registry.snapshot()
    }

    async fn preload(
        &self,
        handle: &LiveSession,
        file_index: usize,
        budget: u64,
    ) -> Result<u64, SessionError> {
        if budget == 0 {
            return Ok(0);
        }

        let torrent = self
            .torrents
            .read()
            .await
            .get(handle.hash())
            .cloned()
            .ok_or_else(|| SessionError::NotFound(handle.hash().to_string()))?;

        let stream = torrent
            .stream(file_index)
            .map_err(|e| SessionError::Internal(format!("Failed to open stream: {}", e)))?;

        let mut limited = Box::pin(stream).take(budget);
        let read = tokio::io::copy(&mut limited, &mut tokio::io::sink())
            .await
            .map_err(|e| SessionError::Internal(format!("Preload failed: {}", e)))?;

        debug!(hash = %handle.hash(), file_index = file_index, bytes = read, "Preload finished");
        Ok(read)
    }
}
