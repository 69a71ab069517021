//! Tracking of in-flight background hydrations.
//!
//! A hydration re-creates a live session from a catalog entry. Every
//! hydration holds a token; `remove`/`detach` revoke it and an explicit
//! `add` supersedes it, so a task that finishes late can tell whether its
//! result is still wanted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::session::InfoHash;

/// State of a hydration token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationState {
    Active,
    /// An explicit add took over; the session stays but catalog values must
    /// not overwrite what the add wrote.
    Superseded,
    /// The torrent was removed or detached; the session must not survive.
    Revoked,
}

impl HydrationState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => HydrationState::Active,
            1 => HydrationState::Superseded,
            _ => HydrationState::Revoked,
        }
    }
}

/// Cancellation token for one hydration.
#[derive(Debug)]
pub struct HydrationToken {
    state: AtomicU8,
}

impl HydrationToken {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(HydrationState::Active as u8),
        }
    }

    pub fn state(&self) -> HydrationState {
        HydrationState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Move away from `Active`. Revocation always wins over supersession.
    fn transition(&self, to: HydrationState) {
        let _ = self
            .state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                match HydrationState::from_u8(current) {
                    HydrationState::Revoked => None,
                    HydrationState::Superseded if to == HydrationState::Superseded => None,
                    _ => Some(to as u8),
                }
            });
    }
}

/// In-flight hydrations keyed by hash. At most one per hash.
#[derive(Debug, Default)]
pub struct HydrationTracker {
    inflight: Mutex<HashMap<InfoHash, Arc<HydrationToken>>>,
}

impl HydrationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hydration for `hash`.
    ///
    /// Returns `None` if one is already in flight.
    pub fn begin(&self, hash: &InfoHash) -> Option<Arc<HydrationToken>> {
        let mut inflight = self.lock();
        if inflight.contains_key(hash) {
            return None;
        }
        let token = Arc::new(HydrationToken::new());
        inflight.insert(hash.clone(), Arc::clone(&token));
        Some(token)
    }

    /// Drop the tracker entry once the hydration task is done.
    pub fn finish(&self, hash: &InfoHash, token: &Arc<HydrationToken>) {
        let mut inflight = self.lock();
        if matches!(inflight.get(hash), Some(current) if Arc::ptr_eq(current, token)) {
            inflight.remove(hash);
        }
    }

    /// An explicit add for `hash` took over.
    pub fn supersede(&self, hash: &InfoHash) {
        if let Some(token) = self.lock().remove(hash) {
            token.transition(HydrationState::Superseded);
        }
    }

    /// `hash` was removed or detached.
    pub fn revoke(&self, hash: &InfoHash) {
        if let Some(token) = self.lock().remove(hash) {
            token.transition(HydrationState::Revoked);
        }
    }

    pub fn revoke_all(&self) {
        for (_, token) in self.lock().drain() {
            token.transition(HydrationState::Revoked);
        }
    }

    pub fn in_flight(&self, hash: &InfoHash) -> bool {
        self.lock().contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<InfoHash, Arc<HydrationToken>>> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
