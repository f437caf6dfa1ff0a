//! Bounded, TTL-expiring cache with single-flight builds.
//!
//! Each key maps to an entry holding a `OnceCell`. The first caller for a
//! missing key runs the builder; concurrent callers for the same key wait on
//! the cell instead of building again. The map lock is only held to look up
//! or replace an entry, never across a build.

use lru::LruCache;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

struct Entry<V> {
    cell: OnceCell<(V, Instant)>,
}

impl<V> Entry<V> {
    fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// In-flight entries never expire
    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        match (ttl, self.cell.get()) {
            (Some(ttl), Some((_, built_at))) => built_at.elapsed() >= ttl,
            _ => false,
        }
    }
}

/// LRU cache whose misses run exactly one builder per key.
pub struct SingleFlightCache<K, V> {
    name: &'static str,
    ttl: Option<Duration>,
    entries: Mutex<LruCache<K, Arc<Entry<V>>>>,
}

impl<K, V> SingleFlightCache<K, V>
where
    K: Hash + Eq + Clone + Debug,
    V: Clone,
{
    /// `capacity` of zero is treated as one; `ttl` of `None` never expires
    pub fn new(name: &'static str, capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            name,
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Return the cached value for `key`, building it on a miss.
    ///
    /// A failed build is not cached: the entry is dropped so the next call
    /// runs the builder again.
    pub async fn get_or_build<F, Fut, E>(&self, key: K, build: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let entry = self.entry(&key);
        if let Some((value, _)) = entry.cell.get() {
            log::debug!("{} cache hit for {key:?}", self.name);
            return Ok(value.clone());
        }

        let name = self.name;
        let key_ref = &key;
        let result = entry
            .cell
            .get_or_try_init(|| async move {
                log::debug!("{name} cache miss for {key_ref:?}, building");
                build().await.map(|value| (value, Instant::now()))
            })
            .await;

        match result {
            Ok((value, _)) => Ok(value.clone()),
            Err(err) => {
                log::warn!("{name} build for {key:?} failed; it will be retried on the next request");
                self.forget(&key, &entry);
                Err(err)
            }
        }
    }

    /// Current entry for `key`, replacing an expired one
    fn entry(&self, key: &K) -> Arc<Entry<V>> {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(key) {
            if !entry.is_expired(self.ttl) {
                return Arc::clone(entry);
            }
            log::debug!("{} cache entry for {key:?} expired", self.name);
        }
        let entry = Arc::new(Entry::new());
        entries.put(key.clone(), Arc::clone(&entry));
        entry
    }

    /// Drop `entry` unless it was already replaced
    fn forget(&self, key: &K, entry: &Arc<Entry<V>>) {
        let mut entries = self.entries.lock();
        if entries
            .peek(key)
            .is_some_and(|current| Arc::ptr_eq(current, entry))
        {
            entries.pop(key);
        }
    }

    /// Remove `key`; returns whether it was present
    pub fn invalidate(&self, key: &K) -> bool {
        self.entries.lock().pop(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of entries, including in-flight builds
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
