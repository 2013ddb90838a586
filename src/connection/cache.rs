//! Process-wide cache of open database handles.
//!
//! Entries are keyed by the full `ConnectionDescriptor` and expire after a
//! fixed lifetime. Expired entries are pruned lazily whenever the cache is
//! touched. The lock is never held across an await.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::{ConnectionDescriptor, SharedClient};

/// Default handle lifetime (two hours).
pub const DEFAULT_TTL: Duration = Duration::from_secs(2 * 60 * 60);

struct CacheEntry {
    handle: SharedClient,
    expires_at: Instant,
}

/// Keyed map of database handles with expiry instants.
pub struct HandleCache {
    ttl: Duration,
    entries: Mutex<HashMap<ConnectionDescriptor, CacheEntry>>,
}

impl Default for HandleCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl HandleCache {
    /// Creates an empty cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionDescriptor, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a live handle for the descriptor, if one is cached.
    pub fn get(&self, descriptor: &ConnectionDescriptor) -> Option<SharedClient> {
        self.get_at(descriptor, Instant::now())
    }

    /// Like `get`, evaluated at the given instant.
    pub fn get_at(&self, descriptor: &ConnectionDescriptor, now: Instant) -> Option<SharedClient> {
        let mut entries = self.lock();
        prune(&mut entries, now);
        entries.get(descriptor).map(|entry| entry.handle.clone())
    }

    /// Stores a handle. A later insert for the same descriptor replaces the earlier one.
    pub fn insert(&self, descriptor: ConnectionDescriptor, handle: SharedClient) {
        self.insert_at(descriptor, handle, Instant::now());
    }

    /// Like `insert`, with the entry's lifetime starting at `now`.
    pub fn insert_at(&self, descriptor: ConnectionDescriptor, handle: SharedClient, now: Instant) {
        let mut entries = self.lock();
        prune(&mut entries, now);
        entries.insert(
            descriptor,
            CacheEntry {
                handle,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Number of entries, including ones that expired but were not yet pruned.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn prune(entries: &mut HashMap<ConnectionDescriptor, CacheEntry>, now: Instant) {
    let before = entries.len();
    entries.retain(|_, entry| entry.expires_at > now);
    let removed = before - entries.len();
    if removed > 0 {
        tracing::debug!(removed, "Pruned expired database handles");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockDatabaseClient;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn descriptor(name: &str) -> ConnectionDescriptor {
        ConnectionDescriptor::Embedded {
            path: PathBuf::from(name),
        }
    }

    fn handle() -> SharedClient {
        Arc::new(MockDatabaseClient::new())
    }

    #[test]
    fn test_get_returns_inserted_handle() {
        let cache = HandleCache::default();
        let h = handle();
        cache.insert(descriptor("a.db"), h.clone());

        let found = cache.get(&descriptor("a.db")).unwrap();
        assert!(Arc::ptr_eq(&found, &h));
        assert!(cache.get(&descriptor("b.db")).is_none());
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let cache = HandleCache::new(Duration::from_secs(60));
        let start = Instant::now();
        cache.insert_at(descriptor("a.db"), handle(), start);

        assert!(cache
            .get_at(&descriptor("a.db"), start + Duration::from_secs(59))
            .is_some());
        assert!(cache
            .get_at(&descriptor("a.db"), start + Duration::from_secs(60))
            .is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lookup_prunes_other_expired_entries() {
        let cache = HandleCache::new(Duration::from_secs(10));
        let start = Instant::now();
        cache.insert_at(descriptor("old.db"), handle(), start);
        cache.insert_at(descriptor("new.db"), handle(), start + Duration::from_secs(8));
        assert_eq!(cache.len(), 2);

        let later = start + Duration::from_secs(12);
        assert!(cache.get_at(&descriptor("new.db"), later).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_last_insert_wins() {
        let cache = HandleCache::default();
        let first = handle();
        let second = handle();
        cache.insert(descriptor("a.db"), first);
        cache.insert(descriptor("a.db"), second.clone());

        assert_eq!(cache.len(), 1);
        let found = cache.get(&descriptor("a.db")).unwrap();
        assert!(Arc::ptr_eq(&found, &second));
    }
}
