//! # TTL store capability
//!
//! The injectable storage interface behind the challenge service and the
//! VP session store. The contract is small — put, get, delete, sweep —
//! plus [`ExpiringStore::update`], the atomic check-and-mutate primitive
//! that single-use semantics hang on.
//!
//! [`MemoryStore`] implements the capability over `DashMap`: `update`
//! holds the entry's shard lock for the duration of the closure, so two
//! concurrent updates of the same key serialize and exactly one observes
//! the prior state. A shared external store can implement the same trait
//! for multi-instance deployments, provided it honors the same atomicity.

use dashmap::DashMap;

use sigil_core::Timestamp;

/// A stored value with its expiry deadline.
#[derive(Debug, Clone)]
pub struct Expiring<V> {
    /// The stored value.
    pub value: V,
    /// When the entry stops being served.
    pub expires_at: Timestamp,
}

impl<V> Expiring<V> {
    /// Whether the entry is past its deadline at `now`.
    pub fn is_expired(&self, now: &Timestamp) -> bool {
        self.expires_at <= *now
    }
}

/// Keyed storage with per-entry expiry.
pub trait ExpiringStore<V>: Send + Sync {
    /// Insert or replace an entry.
    fn put(&self, key: String, value: V, expires_at: Timestamp);

    /// Fetch a live entry. Expired entries are removed on read and
    /// reported as absent.
    fn get(&self, key: &str) -> Option<Expiring<V>>
    where
        V: Clone;

    /// Run `f` against the entry under exclusive access.
    ///
    /// Returns `None` when the key is absent. The closure sees expired
    /// entries too — expiry decisions that must be atomic with a state
    /// change belong inside `f`.
    fn update<R>(&self, key: &str, f: impl FnOnce(&mut Expiring<V>) -> R) -> Option<R>
    where
        Self: Sized;

    /// Remove an entry; `true` if one existed.
    fn delete(&self, key: &str) -> bool;

    /// Remove every entry expired at `now`; returns how many went.
    fn sweep_expired(&self, now: Timestamp) -> usize;
}

/// In-memory [`ExpiringStore`] over a sharded concurrent map.
#[derive(Debug)]
pub struct MemoryStore<V> {
    entries: DashMap<String, Expiring<V>>,
}

impl<V> MemoryStore<V> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Send + Sync> ExpiringStore<V> for MemoryStore<V> {
    fn put(&self, key: String, value: V, expires_at: Timestamp) {
        self.entries.insert(key, Expiring { value, expires_at });
    }

    fn get(&self, key: &str) -> Option<Expiring<V>>
    where
        V: Clone,
    {
        let now = Timestamp::now();
        {
            let entry = self.entries.get(key)?;
            if !entry.is_expired(&now) {
                return Some(entry.value().clone());
            }
        }
        // Lazy expiry: drop the read guard first, then remove, re-checking
        // under the write lock in case the entry was replaced meanwhile.
        self.entries.remove_if(key, |_, e| e.is_expired(&now));
        None
    }

    fn update<R>(&self, key: &str, f: impl FnOnce(&mut Expiring<V>) -> R) -> Option<R> {
        let mut entry = self.entries.get_mut(key)?;
        Some(f(&mut *entry))
    }

    fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    fn sweep_expired(&self, now: Timestamp) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            if entry.is_expired(&now) {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }
}
