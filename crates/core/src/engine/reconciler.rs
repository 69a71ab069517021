//! The reconciliation engine.
//!
//! Keeps the live session set (owned by the [`SessionManager`]) and the
//! durable [`TorrentCatalog`] consistent and presents one record per hash.
//! Catalog-only torrents are restored to live sessions lazily, in the
//! background, the first time they are looked up.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogRecord, TorrentCatalog};
use crate::config::EngineConfig;
use crate::metrics;
use crate::session::{
    InfoHash, LiveSession, MetadataState, SessionError, SessionManager, TorrentSpec,
};
use crate::settings::{BtSettings, SettingsStore};

use super::cache::{cache_dir_for, purge_cache_dir};
use super::clock::Clock;
use super::connection::ConnectionState;
use super::hydration::{HydrationState, HydrationToken, HydrationTracker};
use super::preload::preload_budget;
use super::types::{EngineError, EngineStatus, Resolved, SettingsOutcome, TorrentRecord};

/// What a reconfiguration writes to the settings store.
enum Persist {
    Save(BtSettings),
    Reset,
}

struct EngineInner {
    sessions: Arc<dyn SessionManager>,
    catalog: Arc<dyn TorrentCatalog>,
    settings: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,

    hydrations: HydrationTracker,
    connection: Mutex<ConnectionState>,
    /// Serializes reconfiguration, reconnect and shutdown.
    reconfigure: tokio::sync::Mutex<()>,

    accepting: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,

    expiry_grace: chrono::Duration,
    sweep_interval: Duration,
    metadata_timeout: Duration,
}

/// Handle to the reconciliation engine.
///
/// Cheap to clone; every clone drives the same engine.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    pub fn new(
        sessions: Arc<dyn SessionManager>,
        catalog: Arc<dyn TorrentCatalog>,
        settings: Arc<dyn SettingsStore>,
        clock: Arc<dyn Clock>,
        config: &EngineConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let expiry_grace = chrono::Duration::from_std(config.expiry_grace())
            .unwrap_or_else(|_| chrono::Duration::seconds(60));

        Self {
            inner: Arc::new(EngineInner {
                sessions,
                catalog,
                settings,
                clock,
                hydrations: HydrationTracker::new(),
                connection: Mutex::new(ConnectionState::Connected),
                reconfigure: tokio::sync::Mutex::new(()),
                accepting: AtomicBool::new(true),
                shutdown_tx,
                expiry_grace,
                sweep_interval: config.sweep_interval(),
                metadata_timeout: config.metadata_timeout(),
            }),
        }
    }

    /// Whether requests are still being serviced.
    pub fn is_accepting(&self) -> bool {
        self.inner.accepting.load(Ordering::SeqCst)
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self
            .inner
            .connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Current swarm settings.
    pub fn settings(&self) -> BtSettings {
        self.inner.settings.current()
    }

    pub fn is_read_only(&self) -> bool {
        self.inner.settings.is_read_only()
    }

    /// Number of hydrations currently in flight.
    pub fn pending_hydrations(&self) -> usize {
        self.inner.hydrations.len()
    }

    /// Snapshot of live sessions, catalog size and swarm connection.
    pub async fn status(&self) -> EngineStatus {
        let live = self.inner.sessions.list_active().await;
        let (mut getting_info, mut ready, mut failed) = (0, 0, 0);
        for session in live.values() {
            match session.metadata_state() {
                MetadataState::Pending => getting_info += 1,
                MetadataState::Ready(_) => ready += 1,
                MetadataState::Failed(_) => failed += 1,
            }
        }

        let catalog_entries = match self.inner.catalog.list_all() {
            Ok(stored) => stored.len(),
            Err(e) => {
                warn!(error = %e, "Failed to list catalog");
                0
            }
        };

        EngineStatus {
            accepting: self.is_accepting(),
            connection: self.connection_state(),
            live_sessions: live.len(),
            getting_info,
            ready,
            failed,
            catalog_entries,
            pending_hydrations: self.pending_hydrations(),
            settings_read_only: self.is_read_only(),
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Look up the authoritative record for `hash`.
    ///
    /// A live session has its idle deadline extended. A catalog-only torrent
    /// is returned as-is while a live session is restored in the background.
    pub async fn get_by_hash(&self, hash: &InfoHash) -> Option<TorrentRecord> {
        if !self.is_accepting() {
            return None;
        }

        if let Some(live) = self.inner.sessions.session_for(hash).await {
            live.touch(self.deadline());
            let stored = self.catalog_get(hash);
            return Resolved::from_parts(Some(live), stored).map(Resolved::merge);
        }

        let stored = self.catalog_get(hash)?;
        self.spawn_hydration(&stored);
        Some(Resolved::CatalogOnly(stored).merge())
    }

    /// Every known torrent, live sessions taking precedence.
    ///
    /// Ordered newest first, then by title and hash, both descending.
    pub async fn list(&self) -> Vec<TorrentRecord> {
        if !self.is_accepting() {
            return Vec::new();
        }

        let mut live = self.inner.sessions.list_active().await;
        let mut stored = match self.inner.catalog.list_all() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Failed to list catalog");
                Default::default()
            }
        };

        let mut records: Vec<TorrentRecord> = live
            .drain()
            .filter_map(|(hash, session)| {
                Resolved::from_parts(Some(session), stored.remove(&hash)).map(Resolved::merge)
            })
            .collect();
        records.extend(
            stored
                .into_values()
                .map(|entry| Resolved::CatalogOnly(entry).merge()),
        );

        records.sort_by(TorrentRecord::listing_order);
        records
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Create or attach to the live session for `spec` and fill in its
    /// metadata.
    ///
    /// Each of title, poster and data is set only if the session has none
    /// yet, from the explicit argument, else the catalog entry, else (title
    /// only) the name embedded in the torrent.
    pub async fn add_or_update(
        &self,
        spec: TorrentSpec,
        title: &str,
        poster: &str,
        data: &str,
    ) -> Result<TorrentRecord, EngineError> {
        self.ensure_accepting()?;

        let hash = spec.info_hash.clone();
        self.inner.hydrations.supersede(&hash);

        let live = self.inner.sessions.create(&spec).await?;
        let stored = self.catalog_get(&hash);
        let embedded = live.info_name();

        live.update_metadata(|meta| {
            if meta.title.is_empty() {
                meta.title = first_non_empty([
                    Some(title),
                    stored.as_ref().map(|s| s.title.as_str()),
                    embedded.as_deref(),
                ]);
            }
            if meta.poster.is_empty() {
                meta.poster =
                    first_non_empty([Some(poster), stored.as_ref().map(|s| s.poster.as_str())]);
            }
            if meta.data.is_empty() {
                meta.data =
                    first_non_empty([Some(data), stored.as_ref().map(|s| s.data.as_str())]);
            }
        });
        live.touch(self.deadline());

        if live.metadata().title.is_empty() && !live.has_info() {
            self.spawn_title_from_info(Arc::clone(&live));
        }

        self.refresh_live_gauge().await;
        info!(hash = %hash, source = spec.source.kind(), "Torrent added");

        let resolved = match stored {
            Some(stored) => Resolved::Both(live, stored),
            None => Resolved::LiveOnly(live),
        };
        Ok(resolved.merge())
    }

    /// Overwrite title, poster and data on whichever of live session and
    /// catalog entry exist.
    ///
    /// An empty title falls back to the embedded torrent name. When only a
    /// catalog entry exists that requires restoring the live session first,
    /// which blocks until its metadata is known.
    pub async fn set_metadata(
        &self,
        hash: &InfoHash,
        title: &str,
        poster: &str,
        data: &str,
    ) -> Option<TorrentRecord> {
        if !self.is_accepting() {
            return None;
        }

        let mut live = self.inner.sessions.session_for(hash).await;
        let mut stored = self.catalog_get(hash);
        let mut title = title.to_string();

        if title.is_empty() && live.is_none() {
            if let Some(entry) = &stored {
                live = self.hydrate_now(entry).await;
            }
        }

        if let Some(session) = &live {
            if title.is_empty() {
                title = session.info_name().unwrap_or_default();
            }
            session.update_metadata(|meta| {
                meta.title = title.clone();
                meta.poster = poster.to_string();
                meta.data = data.to_string();
            });
        }

        if let Some(entry) = &mut stored {
            entry.title = title;
            entry.poster = poster.to_string();
            entry.data = data.to_string();
            if let Err(e) = self.inner.catalog.put(entry) {
                warn!(hash = %hash, error = %e, "Failed to update catalog entry");
            }
        }

        Resolved::from_parts(live, stored).map(Resolved::merge)
    }

    /// Write the live record for `hash` to the catalog, stamped with the
    /// current time.
    pub async fn save_to_catalog(&self, hash: &InfoHash) -> Result<TorrentRecord, EngineError> {
        self.ensure_accepting()?;

        let live = self
            .inner
            .sessions
            .session_for(hash)
            .await
            .ok_or_else(|| EngineError::NotFound(hash.to_string()))?;

        let timestamp = self.inner.clock.now().timestamp();
        live.update_metadata(|meta| meta.timestamp = timestamp);

        let meta = live.metadata();
        let record = CatalogRecord {
            hash: hash.clone(),
            title: meta.title,
            poster: meta.poster,
            data: meta.data,
            size: meta.size,
            timestamp,
            spec: Some(live.spec().clone()),
        };
        self.inner.catalog.put(&record)?;

        debug!(hash = %hash, "Saved torrent to catalog");
        Ok(Resolved::Both(live, record).merge())
    }

    /// Save `hash` to the catalog once its metadata is known.
    pub fn save_when_ready(&self, hash: &InfoHash) {
        let engine = self.clone();
        let hash = hash.clone();

        tokio::spawn(async move {
            let Some(live) = engine.inner.sessions.session_for(&hash).await else {
                return;
            };
            if !engine.wait_for_metadata(&live).await {
                debug!(hash = %hash, "Metadata never resolved, not saving to catalog");
                return;
            }
            if let Err(e) = engine.save_to_catalog(&hash).await {
                warn!(hash = %hash, error = %e, "Failed to save torrent to catalog");
            }
        });
    }

    /// Remove `hash` entirely: cached files, live session and catalog entry.
    ///
    /// Every step runs regardless of earlier failures.
    pub async fn remove(&self, hash: &InfoHash) -> Result<(), EngineError> {
        self.ensure_accepting()?;
        self.inner.hydrations.revoke(hash);

        if let Some(dir) = cache_dir_for(&self.inner.settings.current(), hash) {
            let removed = purge_cache_dir(&dir).await;
            debug!(hash = %hash, files = removed, "Purged cache directory");
        }

        if let Err(e) = self.inner.sessions.destroy(hash).await {
            warn!(hash = %hash, error = %e, "Failed to destroy live session");
        }

        if let Err(e) = self.inner.catalog.delete(hash) {
            warn!(hash = %hash, error = %e, "Failed to delete catalog entry");
        }
        // A lookup during the teardown above may have started a new hydration
        self.inner.hydrations.revoke(hash);

        self.refresh_live_gauge().await;
        metrics::REMOVALS.with_label_values(&["remove"]).inc();
        info!(hash = %hash, "Torrent removed");
        Ok(())
    }

    /// Stop only the live session for `hash`. Catalog and cache are kept.
    pub async fn detach(&self, hash: &InfoHash) -> Result<(), EngineError> {
        self.ensure_accepting()?;
        self.inner.hydrations.revoke(hash);

        if let Err(e) = self.inner.sessions.destroy(hash).await {
            warn!(hash = %hash, error = %e, "Failed to destroy live session");
        }

        self.refresh_live_gauge().await;
        metrics::REMOVALS.with_label_values(&["detach"]).inc();
        info!(hash = %hash, "Torrent detached");
        Ok(())
    }

    /// Read ahead the start of file `file_index` of a live torrent.
    ///
    /// Returns the number of bytes read; 0 when the budget is 0.
    pub async fn preload(&self, hash: &InfoHash, file_index: usize) -> Result<u64, EngineError> {
        self.ensure_accepting()?;

        let live = self
            .inner
            .sessions
            .session_for(hash)
            .await
            .ok_or_else(|| EngineError::NotFound(hash.to_string()))?;
        live.touch(self.deadline());

        if !self.wait_for_metadata(&live).await {
            return Err(SessionError::Timeout(format!("metadata for {}", hash)).into());
        }

        let budget = preload_budget(&self.inner.settings.current(), live.metadata().size);
        if budget == 0 {
            debug!(hash = %hash, "Preload budget is 0, skipping");
            return Ok(0);
        }

        let read = self
            .inner
            .sessions
            .preload(&live, file_index, budget)
            .await?;
        metrics::PRELOAD_BYTES.inc_by(read);
        Ok(read)
    }

    // =========================================================================
    // Reconfiguration
    // =========================================================================

    /// Persist new swarm settings and reconnect with them.
    pub async fn apply_settings(
        &self,
        settings: BtSettings,
    ) -> Result<SettingsOutcome, EngineError> {
        self.reconfigure(Persist::Save(settings.normalized())).await
    }

    /// Restore default swarm settings and reconnect with them.
    pub async fn reset_to_default(&self) -> Result<SettingsOutcome, EngineError> {
        self.reconfigure(Persist::Reset).await
    }

    /// Retry connecting the swarm after a failed reconfiguration.
    pub async fn reconnect(&self) -> Result<(), EngineError> {
        self.ensure_accepting()?;
        let _guard = self.inner.reconfigure.lock().await;

        if self.connection_state() == ConnectionState::Connected {
            return Ok(());
        }
        self.connect(&self.inner.settings.current()).await
    }

    async fn reconfigure(&self, persist: Persist) -> Result<SettingsOutcome, EngineError> {
        self.ensure_accepting()?;

        if self.inner.settings.is_read_only() {
            info!("Settings are read-only, ignoring reconfiguration");
            metrics::RECONFIGURATIONS
                .with_label_values(&["read_only"])
                .inc();
            return Ok(SettingsOutcome::ReadOnly);
        }

        let _guard = self.inner.reconfigure.lock().await;
        let result = self.reconfigure_locked(persist).await;

        let label = if result.is_ok() { "applied" } else { "failed" };
        metrics::RECONFIGURATIONS.with_label_values(&[label]).inc();
        result
    }

    async fn reconfigure_locked(&self, persist: Persist) -> Result<SettingsOutcome, EngineError> {
        // Disconnect must finish before the new settings are written
        self.set_connection(ConnectionState::Disconnecting);
        self.inner.hydrations.revoke_all();

        if let Err(e) = self.inner.sessions.disconnect_all().await {
            self.set_connection(ConnectionState::Disconnected);
            warn!(error = %e, "Failed to disconnect swarm");
            return Err(e.into());
        }
        self.set_connection(ConnectionState::Disconnected);
        self.refresh_live_gauge().await;

        let settings = match persist {
            Persist::Save(settings) => self.inner.settings.save(&settings).map(|_| settings),
            Persist::Reset => self.inner.settings.reset_to_default(),
        }
        .map_err(|e| {
            warn!(error = %e, "Failed to persist settings, swarm stays disconnected");
            e
        })?;

        self.connect(&settings).await?;
        info!("Swarm settings applied");
        Ok(SettingsOutcome::Applied)
    }

    async fn connect(&self, settings: &BtSettings) -> Result<(), EngineError> {
        self.set_connection(ConnectionState::Reconnecting);

        match self.inner.sessions.reconnect_all(settings).await {
            Ok(()) => {
                self.set_connection(ConnectionState::Connected);
                info!(backend = self.inner.sessions.name(), "Swarm connected");
                Ok(())
            }
            Err(e) => {
                self.set_connection(ConnectionState::Disconnected);
                warn!(error = %e, "Failed to reconnect swarm");
                Err(e.into())
            }
        }
    }

    fn set_connection(&self, next: ConnectionState) {
        let mut state = self
            .inner
            .connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !state.can_transition_to(next) {
            debug!(
                from = state.as_str(),
                to = next.as_str(),
                "Unexpected connection transition"
            );
        }
        *state = next;
    }

    // =========================================================================
    // Expiry & shutdown
    // =========================================================================

    /// Tear down every live session whose idle deadline has passed.
    ///
    /// Catalog entries are kept. Returns the hashes torn down.
    pub async fn sweep_idle(&self) -> Vec<InfoHash> {
        if !self.is_accepting() {
            return Vec::new();
        }

        let now = self.inner.clock.now();
        let mut expired = Vec::new();

        for (hash, live) in self.inner.sessions.list_active().await {
            if !live.is_expired(now) {
                continue;
            }
            self.inner.hydrations.revoke(&hash);
            match self.inner.sessions.destroy(&hash).await {
                Ok(true) => {
                    debug!(hash = %hash, "Idle session expired");
                    metrics::SESSIONS_EXPIRED.inc();
                    expired.push(hash);
                }
                Ok(false) => {}
                Err(e) => warn!(hash = %hash, error = %e, "Failed to tear down idle session"),
            }
        }

        if !expired.is_empty() {
            self.refresh_live_gauge().await;
        }
        expired
    }

    /// Run [`Engine::sweep_idle`] periodically until shutdown.
    pub fn spawn_idle_sweeper(&self) -> JoinHandle<()> {
        let engine = self.clone();
        let interval = self.inner.sweep_interval;
        let mut shutdown_rx = self.inner.shutdown_tx.subscribe();

        tokio::spawn(async move {
            debug!("Idle sweeper started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("Idle sweeper received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !engine.is_accepting() {
                            break;
                        }
                        let expired = engine.sweep_idle().await;
                        if !expired.is_empty() {
                            info!(count = expired.len(), "Tore down idle sessions");
                        }
                    }
                }
            }
        })
    }

    /// Stop servicing requests and release every resource.
    ///
    /// In-flight hydrations are abandoned. Safe to call more than once.
    pub async fn shutdown(&self) {
        if !self.inner.accepting.swap(false, Ordering::SeqCst) {
            debug!("Engine already shut down");
            return;
        }

        info!("Shutting down engine");
        let _ = self.inner.shutdown_tx.send(());
        self.inner.hydrations.revoke_all();

        let _guard = self.inner.reconfigure.lock().await;
        self.set_connection(ConnectionState::Disconnecting);
        if let Err(e) = self.inner.sessions.disconnect_all().await {
            warn!(error = %e, "Failed to disconnect swarm during shutdown");
        }
        self.set_connection(ConnectionState::Disconnected);
        metrics::LIVE_SESSIONS.set(0);

        if let Err(e) = self.inner.catalog.close() {
            warn!(error = %e, "Failed to close catalog");
        }
        if let Err(e) = self.inner.settings.close() {
            warn!(error = %e, "Failed to close settings store");
        }

        info!("Engine shut down");
    }

    // =========================================================================
    // Hydration
    // =========================================================================

    /// Restore a live session for `stored` in the background.
    ///
    /// No-op for dead entries or when a hydration is already in flight.
    fn spawn_hydration(&self, stored: &CatalogRecord) {
        let Some(spec) = stored.spec.clone() else {
            debug!(hash = %stored.hash, "Catalog entry has no spec, not hydrating");
            return;
        };
        let Some(token) = self.inner.hydrations.begin(&stored.hash) else {
            return;
        };

        let engine = self.clone();
        let stored = stored.clone();

        tokio::spawn(async move {
            let started = Instant::now();
            let result = engine.hydrate(&spec, &stored, &token).await;
            engine.inner.hydrations.finish(&stored.hash, &token);

            metrics::HYDRATIONS.with_label_values(&[result]).inc();
            metrics::HYDRATION_DURATION
                .with_label_values(&[result])
                .observe(started.elapsed().as_secs_f64());
            debug!(hash = %stored.hash, result = result, "Hydration finished");
        });
    }

    /// Body of a background hydration. Returns the metrics label.
    async fn hydrate(
        &self,
        spec: &TorrentSpec,
        stored: &CatalogRecord,
        token: &HydrationToken,
    ) -> &'static str {
        let hash = &stored.hash;
        let existed = self.inner.sessions.session_for(hash).await.is_some();

        let live = match self.inner.sessions.create(spec).await {
            Ok(live) => live,
            Err(e) => {
                debug!(hash = %hash, error = %e, "Hydration failed to create session");
                return "failed";
            }
        };

        if self.discard_if_stale(token, &live, existed).await {
            return "revoked";
        }
        if token.state() == HydrationState::Superseded {
            return "superseded";
        }

        copy_catalog_fields(&live, stored);
        live.touch(self.deadline());
        self.refresh_live_gauge().await;

        let ready = tokio::time::timeout(
            self.inner.metadata_timeout,
            self.inner.sessions.wait_for_metadata(&live),
        )
        .await;

        if self.discard_if_stale(token, &live, existed).await {
            return "revoked";
        }

        match ready {
            Ok(true) => "ready",
            Ok(false) => "failed",
            Err(_) => "timeout",
        }
    }

    /// Tear down a session this hydration created if it must no longer
    /// apply: its token was revoked, or the catalog entry it restores is gone.
    async fn discard_if_stale(
        &self,
        token: &HydrationToken,
        live: &Arc<LiveSession>,
        existed: bool,
    ) -> bool {
        let revoked = token.state() == HydrationState::Revoked;
        if !revoked && self.catalog_get(live.hash()).is_some() {
            return false;
        }
        if existed {
            return true;
        }

        let current = self.inner.sessions.session_for(live.hash()).await;
        if matches!(current, Some(current) if Arc::ptr_eq(&current, live)) {
            if let Err(e) = self.inner.sessions.destroy(live.hash()).await {
                warn!(hash = %live.hash(), error = %e, "Failed to discard revoked session");
            }
            self.refresh_live_gauge().await;
        }
        true
    }

    /// Restore a live session for `stored` and wait for its metadata.
    ///
    /// Returns `None` if the session could not be created.
    async fn hydrate_now(&self, stored: &CatalogRecord) -> Option<Arc<LiveSession>> {
        let spec = stored.spec.as_ref()?;

        let live = match self.inner.sessions.create(spec).await {
            Ok(live) => live,
            Err(e) => {
                warn!(hash = %stored.hash, error = %e, "Failed to restore torrent session");
                return None;
            }
        };
        copy_catalog_fields(&live, stored);
        live.touch(self.deadline());
        self.refresh_live_gauge().await;

        if !self.wait_for_metadata(&live).await {
            debug!(hash = %stored.hash, "Metadata unavailable for restored session");
        }
        Some(live)
    }

    /// Fill an empty title from the embedded name once metadata resolves.
    fn spawn_title_from_info(&self, live: Arc<LiveSession>) {
        let engine = self.clone();
        tokio::spawn(async move {
            if !engine.wait_for_metadata(&live).await {
                return;
            }
            if let Some(name) = live.info_name() {
                live.update_metadata(|meta| {
                    if meta.title.is_empty() {
                        meta.title = name;
                    }
                });
            }
        });
    }

    async fn wait_for_metadata(&self, live: &LiveSession) -> bool {
        tokio::time::timeout(
            self.inner.metadata_timeout,
            self.inner.sessions.wait_for_metadata(live),
        )
        .await
        .unwrap_or(false)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn ensure_accepting(&self) -> Result<(), EngineError> {
        if self.is_accepting() {
            Ok(())
        } else {
            Err(EngineError::ShuttingDown)
        }
    }

    fn deadline(&self) -> DateTime<Utc> {
        self.inner.clock.now() + self.inner.expiry_grace
    }

    fn catalog_get(&self, hash: &InfoHash) -> Option<CatalogRecord> {
        match self.inner.catalog.get(hash) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(hash = %hash, error = %e, "Failed to read catalog entry");
                None
            }
        }
    }

    async fn refresh_live_gauge(&self) {
        let count = self.inner.sessions.list_active().await.len();
        metrics::LIVE_SESSIONS.set(count as i64);
    }
}

/// Copy catalog metadata onto a restored session, never over values
/// already present.
fn copy_catalog_fields(live: &LiveSession, stored: &CatalogRecord) {
    live.update_metadata(|meta| {
        if meta.title.is_empty() {
            meta.title = stored.title.clone();
        }
        if meta.poster.is_empty() {
            meta.poster = stored.poster.clone();
        }
        if meta.data.is_empty() {
            meta.data = stored.data.clone();
        }
        if meta.size == 0 {
            meta.size = stored.size;
        }
        if meta.timestamp == 0 {
            meta.timestamp = stored.timestamp;
        }
    });
}

fn first_non_empty<'a, const N: usize>(candidates: [Option<&'a str>; N]) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty())
        .unwrap_or_default()
        .to_string()
}
