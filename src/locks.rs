//! Per-key serialization of admission decisions.
//!
//! `SQLite` has no `SELECT ... FOR UPDATE`, so writes that affect a
//! (sector, unit) pair take an application-level lock for that pair first.
//! Different keys never contend with each other.

use std::{
    collections::HashMap,
    hash::Hash,
    sync::{Arc, Mutex, PoisonError},
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A set of async mutexes, one per key, created on demand.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    inner: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty lock set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`. Access ends when the guard drops.
    pub async fn lock(&self, key: &K) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries nobody holds or waits on can go
            map.retain(|_, mutex| Arc::strong_count(mutex) > 1);
            Arc::clone(map.entry(key.clone()).or_default())
        };
        mutex.lock_owned().await
    }

    /// Number of keys currently locked or waited on.
    #[cfg(test)]
    fn active_keys(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|mutex| Arc::strong_count(mutex) > 1)
            .count()
    }
}
