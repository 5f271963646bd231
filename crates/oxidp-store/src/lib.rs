//! # oxidp-store
//!
//! Generic concurrency-safe keyed stores for oxidp.
//!
//! The provider core keeps clients, tokens, flow sessions, pairwise
//! identifiers and approval counters in simple in-memory stores. All of
//! them share the same access pattern: lookup by primary key, occasional
//! lookup by a secondary predicate, and wall-clock expiry. [`KeyedStore`]
//! implements that pattern once, backed by a [`parking_lot::RwLock`] so
//! concurrent request handlers can read safely.
//!
//! Expiry is enforced on access: a `get` that finds an expired entry
//! removes it and reports a miss. [`KeyedStore::purge_expired`] is
//! available for callers that want an explicit sweep.

#![deny(missing_docs)]

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// A stored value together with its optional expiry instant.
#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Option<DateTime<Utc>>,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// A concurrency-safe map from key to value with on-access eviction.
///
/// Values are cloned out on read; keep stored types cheap to clone or
/// wrap them in `Arc`.
#[derive(Debug)]
pub struct KeyedStore<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
}

impl<K, V> Default for KeyedStore<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> KeyedStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value without an expiry, replacing any previous entry.
    pub fn insert(&self, key: K, value: V) {
        self.entries.write().insert(
            key,
            Entry {
                value,
                expires_at: None,
            },
        );
    }

    /// Inserts a value that expires at the given instant.
    pub fn insert_until(&self, key: K, value: V, expires_at: DateTime<Utc>) {
        self.entries.write().insert(
            key,
            Entry {
                value,
                expires_at: Some(expires_at),
            },
        );
    }

    /// Returns the value for `key`, evicting it first if it has expired.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Utc::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Expired: upgrade to a write lock and evict.
        self.entries.write().remove(key);
        None
    }

    /// Removes and returns the value for `key`, if present and live.
    pub fn remove(&self, key: &K) -> Option<V> {
        let now = Utc::now();
        let entry = self.entries.write().remove(key)?;
        if entry.is_expired(now) {
            None
        } else {
            Some(entry.value)
        }
    }

    /// Returns the first live value matching `predicate`.
    #[must_use]
    pub fn find<P>(&self, predicate: P) -> Option<V>
    where
        P: Fn(&V) -> bool,
    {
        let now = Utc::now();
        let entries = self.entries.read();
        entries
            .values()
            .find(|entry| !entry.is_expired(now) && predicate(&entry.value))
            .map(|entry| entry.value.clone())
    }

    /// Returns all live values matching `predicate`.
    #[must_use]
    pub fn find_all<P>(&self, predicate: P) -> Vec<V>
    where
        P: Fn(&V) -> bool,
    {
        let now = Utc::now();
        let entries = self.entries.read();
        entries
            .values()
            .filter(|entry| !entry.is_expired(now) && predicate(&entry.value))
            .map(|entry| entry.value.clone())
            .collect()
    }

    /// Applies `update` to the value for `key`, if present and live.
    ///
    /// Returns `true` when an entry was updated.
    pub fn update<F>(&self, key: &K, update: F) -> bool
    where
        F: FnOnce(&mut V),
    {
        let now = Utc::now();
        let mut entries = self.entries.write();
        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                update(&mut entry.value);
                true
            }
            _ => false,
        }
    }

    /// Removes all expired entries and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Number of entries currently held, including not-yet-evicted
    /// expired ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn insert_and_get() {
        let store = KeyedStore::new();
        store.insert("a", 1);
        assert_eq!(store.get(&"a"), Some(1));
        assert_eq!(store.get(&"b"), None);
    }

    #[test]
    fn expired_entries_are_evicted_on_access() {
        let store = KeyedStore::new();
        store.insert_until("a", 1, Utc::now() - Duration::seconds(1));
        assert_eq!(store.get(&"a"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn live_entries_survive_access() {
        let store = KeyedStore::new();
        store.insert_until("a", 1, Utc::now() + Duration::hours(1));
        assert_eq!(store.get(&"a"), Some(1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn find_matches_live_values_only() {
        let store = KeyedStore::new();
        store.insert("a", 10);
        store.insert_until("b", 20, Utc::now() - Duration::seconds(1));
        assert_eq!(store.find(|v| *v >= 10), Some(10));
        assert_eq!(store.find(|v| *v >= 20), None);
    }

    #[test]
    fn update_in_place() {
        let store = KeyedStore::new();
        store.insert("a", 1);
        assert!(store.update(&"a", |v| *v += 1));
        assert_eq!(store.get(&"a"), Some(2));
        assert!(!store.update(&"missing", |v| *v += 1));
    }

    #[test]
    fn purge_removes_expired() {
        let store = KeyedStore::new();
        store.insert("a", 1);
        store.insert_until("b", 2, Utc::now() - Duration::seconds(1));
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
    }
}
