//! String-keyed map whose entries expire at an absolute deadline.
//!
//! Expiry is both lazy and periodic: [`ExpiringGuard::get_live_mut`] evicts an
//! expired entry when it is touched, and [`ExpiringMap::purge_expired`] removes
//! every expired entry in one pass (driven by a background sweep).
//!
//! The map uses `tokio::time::Instant` so tests can drive it with a paused clock.

use std::collections::HashMap;

use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;

/// A stored value together with its expiry deadline.
#[derive(Debug, Clone)]
pub struct Expiring<V> {
    pub value: V,
    pub expires_at: Instant,
}

impl<V> Expiring<V> {
    /// An entry is live while `now <= expires_at`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// Thread-safe expiring map.
///
/// All access goes through [`ExpiringMap::lock`], so a caller can perform a
/// check-then-update sequence atomically with respect to other tasks.
pub struct ExpiringMap<V> {
    entries: Mutex<HashMap<String, Expiring<V>>>,
}

impl<V> ExpiringMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire exclusive access to the entries.
    pub async fn lock(&self) -> ExpiringGuard<'_, V> {
        ExpiringGuard {
            entries: self.entries.lock().await,
        }
    }

    /// Remove every entry whose deadline has passed. Returns the number removed.
    pub async fn purge_expired(&self, now: Instant) -> usize {
        self.lock().await.purge_expired(now)
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<V> Default for ExpiringMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Locked view over an [`ExpiringMap`].
pub struct ExpiringGuard<'a, V> {
    entries: MutexGuard<'a, HashMap<String, Expiring<V>>>,
}

impl<V> ExpiringGuard<'_, V> {
    /// Stored entry for `key`, with no expiry check.
    pub fn get(&self, key: &str) -> Option<&Expiring<V>> {
        self.entries.get(key)
    }

    /// Live entry for `key`. An expired entry is removed and `None` returned.
    pub fn get_live_mut(&mut self, key: &str, now: Instant) -> Option<&mut Expiring<V>> {
        if self.entries.get(key).is_some_and(|e| e.is_expired(now)) {
            self.entries.remove(key);
            return None;
        }
        self.entries.get_mut(key)
    }

    /// Insert or replace the entry for `key`, returning the previous one.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: V,
        expires_at: Instant,
    ) -> Option<Expiring<V>> {
        self.entries
            .insert(key.into(), Expiring { value, expires_at })
    }

    pub fn remove(&mut self, key: &str) -> Option<Expiring<V>> {
        self.entries.remove(key)
    }

    /// Keep only entries for which `keep` returns `true`. Returns the number removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &Expiring<V>) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, e| keep(k, e));
        before - self.entries.len()
    }

    pub fn purge_expired(&mut self, now: Instant) -> usize {
        self.retain(|_, e| !e.is_expired(now))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries that have not yet expired at `now`.
    pub fn live_len(&self, now: Instant) -> usize {
        self.entries.values().filter(|e| !e.is_expired(now)).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expiring<V>)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }
}
