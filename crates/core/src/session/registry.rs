//! At-most-one-session-per-hash map shared by session backends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::live::LiveSession;
use super::spec::{InfoHash, TorrentSpec};

/// Registry of live sessions keyed by info hash.
///
/// Creation goes through [`SessionRegistry::get_or_insert`], which holds the
/// map lock for the whole check-and-insert so concurrent callers for the same
/// hash always get the same handle back.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<InfoHash, Arc<LiveSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the existing session for the spec's hash, or register a new one.
    ///
    /// The boolean is `true` when the session was created by this call.
    pub fn get_or_insert(&self, spec: &TorrentSpec) -> (Arc<LiveSession>, bool) {
        let mut sessions = self.lock();
        if let Some(existing) = sessions.get(&spec.info_hash) {
            return (Arc::clone(existing), false);
        }
        let session = Arc::new(LiveSession::new(spec.clone()));
        sessions.insert(spec.info_hash.clone(), Arc::clone(&session));
        (session, true)
    }

    pub fn get(&self, hash: &InfoHash) -> Option<Arc<LiveSession>> {
        self.lock().get(hash).cloned()
    }

    pub fn remove(&self, hash: &InfoHash) -> Option<Arc<LiveSession>> {
        self.lock().remove(hash)
    }

    /// Remove `hash` only if it still maps to `session`.
    pub fn remove_if_same(&self, hash: &InfoHash, session: &Arc<LiveSession>) -> bool {
        let mut sessions = self.lock();
        match sessions.get(hash) {
            Some(current) if Arc::ptr_eq(current, session) => {
                sessions.remove(hash);
                true
            }
            _ => false,
        }
    }

    pub fn snapshot(&self) -> HashMap<InfoHash, Arc<LiveSession>> {
        self.lock().clone()
    }

    /// Drop every session, returning what was registered.
    pub fn drain(&self) -> Vec<Arc<LiveSession>> {
        self.lock().drain().map(|(_, s)| s).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<InfoHash, Arc<LiveSession>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(hash: &str) -> TorrentSpec {
        TorrentSpec::parse_link(hash).unwrap()
    }

    #[test]
    fn test_get_or_insert_is_idempotent() {
        let registry = SessionRegistry::new();
        let s = spec("a94a8fe5ccb19ba61c4c0873d391e987982fbbd3");

        let (first, created_first) = registry.get_or_insert(&s);
        let (second, created_second) = registry.get_or_insert(&s);

        assert!(created_first);
        assert!(!created_second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_if_same_ignores_replaced_session() {
        let registry = SessionRegistry::new();
        let s = spec("a94a8fe5ccb19ba61c4c0873d391e987982fbbd3");

        let (stale, _) = registry.get_or_insert(&s);
        registry.remove(&s.info_hash);
        let (fresh, _) = registry.get_or_insert(&s);

        assert!(!registry.remove_if_same(&s.info_hash, &stale));
        assert!(registry.get(&s.info_hash).is_some());
        assert!(registry.remove_if_same(&s.info_hash, &fresh));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_inserts_yield_one_session() {
        let registry = Arc::new(SessionRegistry::new());
        let s = spec("0123456789abcdef0123456789abcdef01234567");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let s = s.clone();
                std::thread::spawn(move || registry.get_or_insert(&s))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let created = results.iter().filter(|(_, created)| *created).count();

        assert_eq!(created, 1);
        assert!(results
            .windows(2)
            .all(|w| Arc::ptr_eq(&w[0].0, &w[1].0)));
    }
}
