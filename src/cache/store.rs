//! Expiring Cache Module
//!
//! Key-value store whose entries silently lapse once older than a configured
//! max age. Expiry is checked lazily on access; there is no background sweep.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::cache::CacheEntry;

/// Point-in-time counters of an [`ExpiringCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered with a live entry
    pub hits: u64,
    /// Lookups that found no live entry, expired ones included
    pub misses: u64,
    /// Entries evicted on access for outliving the max age
    pub expirations: u64,
    /// Entries currently stored
    pub total_entries: usize,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache, 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            lookups => self.hits as f64 / lookups as f64,
        }
    }
}

// == Expiring Cache ==
/// Time-bounded cache keyed by string.
///
/// A `max_age` of zero keeps entries until they are overwritten, removed, or
/// the cache is cleared. There is no capacity limit.
#[derive(Debug)]
pub struct ExpiringCache<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Maximum age before an entry is treated as absent
    max_age: Duration,
    hits: u64,
    misses: u64,
    expirations: u64,
}

impl<V: Clone> ExpiringCache<V> {
    // == Constructor ==
    /// Creates an empty cache whose entries expire after `max_age`.
    pub fn new(max_age: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            max_age,
            hits: 0,
            misses: 0,
            expirations: 0,
        }
    }

    /// Returns the configured max age.
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    // == Set ==
    /// Stores `value` under `key`, stamped with the current monotonic time.
    ///
    /// Overwriting an existing key resets its age.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        self.set_at(key, value, Instant::now());
    }

    /// Stores `value` under `key` as if it had been stored at `now`.
    pub fn set_at(&mut self, key: impl Into<String>, value: V, now: Instant) {
        self.entries
            .insert(key.into(), CacheEntry::stored_at(value, now));
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns `None` if the key is absent or its entry has outlived the max
    /// age; an expired entry is removed as a side effect.
    pub fn get(&mut self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Retrieves a value by key, judging its age as of `now`.
    pub fn get_at(&mut self, key: &str, now: Instant) -> Option<V> {
        let value = if self.check_age(key, now) {
            self.entries.get(key).map(|entry| entry.value.clone())
        } else {
            None
        };

        match value {
            Some(_) => self.hits += 1,
            None => self.misses += 1,
        }
        value
    }

    // == Contains ==
    /// Reports whether `key` holds a live entry, without cloning the value.
    ///
    /// Applies the same age check as [`get`](Self::get), so an expired entry is
    /// evicted here too.
    pub fn contains(&mut self, key: &str) -> bool {
        self.contains_at(key, Instant::now())
    }

    /// Same as [`contains`](Self::contains), judging age as of `now`.
    pub fn contains_at(&mut self, key: &str, now: Instant) -> bool {
        self.check_age(key, now)
    }

    // == Remove ==
    /// Removes an entry regardless of its age, returning its value if present.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.remove(key).map(|entry| entry.value)
    }

    // == Clear ==
    /// Drops every entry. Statistics counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            expirations: self.expirations,
            total_entries: self.entries.len(),
        }
    }

    // == Length ==
    /// Returns the number of stored entries, including any not yet found expired.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evicts `key` if it has expired as of `now`.
    ///
    /// Returns true if a live entry remains under `key`.
    fn check_age(&mut self, key: &str, now: Instant) -> bool {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired_at(self.max_age, now),
            None => return false,
        };

        if expired {
            self.entries.remove(key);
            self.expirations += 1;
            return false;
        }

        true
    }
}
