//! Mock swarm session manager for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::session::{
    InfoHash, LiveSession, SessionError, SessionManager, SessionRegistry, TorrentInfo,
    TorrentSpec,
};
use crate::settings::BtSettings;

/// A recorded preload call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPreload {
    pub hash: InfoHash,
    pub file_index: usize,
    pub budget: u64,
}

/// Mock implementation of the SessionManager trait.
///
/// Provides controllable behavior for testing:
/// - Track `create` calls per hash for assertions
/// - Resolve metadata immediately or on demand
/// - Simulate slow creation and failing disconnect/reconnect
///
/// # Example
///
/// ```rust,ignore
/// let sessions = MockSessionManager::new();
/// sessions.set_torrent_info(&hash, "Embedded Name", 4096).await;
///
/// let live = sessions.create(&spec).await?;
/// assert_eq!(live.info_name().as_deref(), Some("Embedded Name"));
/// assert_eq!(sessions.create_count(&hash).await, 1);
/// ```
#[derive(Debug)]
pub struct MockSessionManager {
    registry: SessionRegistry,
    /// Recorded create calls, in order.
    creates: Arc<RwLock<Vec<InfoHash>>>,
    /// Metadata to publish when a session resolves.
    infos: Arc<RwLock<HashMap<InfoHash, TorrentInfo>>>,
    /// Recorded preload calls.
    preloads: Arc<RwLock<Vec<RecordedPreload>>>,
    /// If set, the next create will fail with this error.
    next_error: Arc<RwLock<Option<SessionError>>>,
    /// Artificial latency of create.
    create_delay: Arc<RwLock<Option<Duration>>>,
    /// Artificial latency of destroy.
    destroy_delay: Arc<RwLock<Option<Duration>>>,
    /// Settings passed to the last successful reconnect.
    last_settings: Arc<RwLock<Option<BtSettings>>>,
    auto_resolve: AtomicBool,
    connected: AtomicBool,
    fail_disconnect: AtomicBool,
    fail_reconnect: AtomicBool,
    disconnects: AtomicUsize,
    reconnects: AtomicUsize,
}

impl Default for MockSessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSessionManager {
    /// Create a connected mock whose sessions resolve metadata immediately.
    pub fn new() -> Self {
        Self {
            registry: SessionRegistry::new(),
            creates: Arc::new(RwLock::new(Vec::new())),
            infos: Arc::new(RwLock::new(HashMap::new())),
            preloads: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            create_delay: Arc::new(RwLock::new(None)),
            destroy_delay: Arc::new(RwLock::new(None)),
            last_settings: Arc::new(RwLock::new(None)),
            auto_resolve: AtomicBool::new(true),
            connected: AtomicBool::new(true),
            fail_disconnect: AtomicBool::new(false),
            fail_reconnect: AtomicBool::new(false),
            disconnects: AtomicUsize::new(0),
            reconnects: AtomicUsize::new(0),
        }
    }

    /// Create a mock whose sessions stay pending until [`Self::resolve`].
    pub fn manual() -> Self {
        let mock = Self::new();
        mock.auto_resolve.store(false, Ordering::SeqCst);
        mock
    }

    /// Metadata published when the session for `hash` resolves.
    pub async fn set_torrent_info(&self, hash: &InfoHash, name: &str, size_bytes: u64) {
        self.infos.write().await.insert(
            hash.clone(),
            TorrentInfo {
                name: name.to_string(),
                size_bytes,
            },
        );
    }

    /// Resolve the metadata of a pending session. Returns false if there is
    /// no session for `hash`.
    pub async fn resolve(&self, hash: &InfoHash) -> bool {
        match self.registry.get(hash) {
            Some(live) => {
                self.publish_info(&live).await;
                true
            }
            None => false,
        }
    }

    /// Fail the metadata of a pending session permanently.
    pub fn fail(&self, hash: &InfoHash, reason: &str) -> bool {
        match self.registry.get(hash) {
            Some(live) => {
                live.mark_failed(reason);
                true
            }
            None => false,
        }
    }

    /// Configure the next create to fail with the given error.
    pub async fn set_next_error(&self, error: SessionError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every create take `delay` before registering the session.
    pub async fn set_create_delay(&self, delay: Duration) {
        *self.create_delay.write().await = Some(delay);
    }

    /// Make every destroy take `delay` before dropping the session.
    pub async fn set_destroy_delay(&self, delay: Duration) {
        *self.destroy_delay.write().await = Some(delay);
    }

    pub fn set_fail_disconnect(&self, fail: bool) {
        self.fail_disconnect.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reconnect(&self, fail: bool) {
        self.fail_reconnect.store(fail, Ordering::SeqCst);
    }

    /// Number of create calls made for `hash`.
    pub async fn create_count(&self, hash: &InfoHash) -> usize {
        self.creates
            .read()
            .await
            .iter()
            .filter(|h| *h == hash)
            .count()
    }

    /// Get all recorded preload calls.
    pub async fn preloads(&self) -> Vec<RecordedPreload> {
        self.preloads.read().await.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn reconnect_count(&self) -> usize {
        self.reconnects.load(Ordering::SeqCst)
    }

    /// Settings passed to the last successful reconnect.
    pub async fn last_settings(&self) -> Option<BtSettings> {
        self.last_settings.read().await.clone()
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    async fn publish_info(&self, live: &LiveSession) {
        let info = self
            .infos
            .read()
            .await
            .get(live.hash())
            .cloned()
            .unwrap_or_else(|| TorrentInfo {
                name: live
                    .spec()
                    .display_name
                    .clone()
                    .unwrap_or_else(|| format!("torrent-{}", &live.hash().as_str()[..8])),
                size_bytes: 0,
            });
        live.mark_ready(info);
    }

    async fn take_error(&self) -> Option<SessionError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl SessionManager for MockSessionManager {
    fn name(&self) -> &str {
        "mock"
    }

    async fn session_for(&self, hash: &InfoHash) -> Option<Arc<LiveSession>> {
        self.registry.get(hash)
    }

    async fn create(&self, spec: &TorrentSpec) -> Result<Arc<LiveSession>, SessionError> {
        self.creates.write().await.push(spec.info_hash.clone());

        if let Some(error) = self.take_error().await {
            return Err(error);
        }

        let delay = *self.create_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if !self.is_connected() {
            return Err(SessionError::Disconnected);
        }

        let (live, created) = self.registry.get_or_insert(spec);
        if created && self.auto_resolve.load(Ordering::SeqCst) {
            self.publish_info(&live).await;
        }
        Ok(live)
    }

    async fn destroy(&self, hash: &InfoHash) -> Result<bool, SessionError> {
        let delay = *self.destroy_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.registry.remove(hash) {
            Some(live) => {
                live.mark_failed("session destroyed");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn disconnect_all(&self) -> Result<(), SessionError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        if self.fail_disconnect.load(Ordering::SeqCst) {
            return Err(SessionError::ConnectionFailed(
                "mock disconnect failure".to_string(),
            ));
        }

        self.connected.store(false, Ordering::SeqCst);
        for live in self.registry.drain() {
            live.mark_failed("session manager disconnected");
        }
        Ok(())
    }

    async fn reconnect_all(&self, settings: &BtSettings) -> Result<(), SessionError> {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        if self.fail_reconnect.load(Ordering::SeqCst) {
            return Err(SessionError::ConnectionFailed(
                "mock reconnect failure".to_string(),
            ));
        }

        self.connected.store(true, Ordering::SeqCst);
        *self.last_settings.write().await = Some(settings.clone());
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
        if self.registry.get(handle.hash()).is_none() {
            return Err(SessionError::NotFound(handle.hash().to_string()));
        }
        self.preloads.write().await.push(RecordedPreload {
            hash: handle.hash().clone(),
            file_index,
            budget,
        });
        Ok(budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> TorrentSpec {
        TorrentSpec::parse_link("a94a8fe5ccb19ba61c4c0873d391e987982fbbd3").unwrap()
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let mock = MockSessionManager::new();
        let a = mock.create(&spec()).await.unwrap();
        let b = mock.create(&spec()).await.unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(mock.session_count(), 1);
        assert_eq!(mock.create_count(&spec().info_hash).await, 2);
    }

    #[tokio::test]
    async fn test_auto_resolve_uses_configured_info() {
        let mock = MockSessionManager::new();
        mock.set_torrent_info(&spec().info_hash, "Embedded", 99).await;

        let live = mock.create(&spec()).await.unwrap();
        assert_eq!(live.info_name().as_deref(), Some("Embedded"));
        assert_eq!(live.metadata().size, 99);
    }

    #[tokio::test]
    async fn test_manual_resolution() {
        let mock = MockSessionManager::manual();
        let live = mock.create(&spec()).await.unwrap();
        assert!(!live.has_info());

        assert!(mock.resolve(&spec().info_hash).await);
        assert!(mock.wait_for_metadata(&live).await);
    }

    #[tokio::test]
    async fn test_next_error_applies_once() {
        let mock = MockSessionManager::new();
        mock.set_next_error(SessionError::AddFailed("boom".to_string()))
            .await;

        assert!(mock.create(&spec()).await.is_err());
        assert!(mock.create(&spec()).await.is_ok());
    }

    #[tokio::test]
    async fn test_disconnect_blocks_create() {
        let mock = MockSessionManager::new();
        mock.create(&spec()).await.unwrap();

        mock.disconnect_all().await.unwrap();
        assert_eq!(mock.session_count(), 0);
        assert!(!mock.is_connected());
        assert!(matches!(
            mock.create(&spec()).await,
            Err(SessionError::Disconnected)
        ));

        mock.reconnect_all(&BtSettings::default()).await.unwrap();
        assert!(mock.create(&spec()).await.is_ok());
    }
}
