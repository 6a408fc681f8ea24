//! Cache Entry Module
//!
//! Defines a single cached value stamped with the monotonic time it was stored.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// Represents a single cache entry with its storage timestamp.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Monotonic timestamp taken when the value was stored
    pub stored_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped with the current monotonic time.
    pub fn new(value: V) -> Self {
        Self::stored_at(value, Instant::now())
    }

    /// Creates a new entry stamped with an explicit time.
    pub fn stored_at(value: V, stored_at: Instant) -> Self {
        Self { value, stored_at }
    }

    // == Age ==
    /// Returns how long the entry has been stored as of `now`.
    ///
    /// Saturates to zero if `now` is earlier than the storage time.
    pub fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }

    // == Is Expired ==
    /// Checks whether the entry is older than `max_age` as of `now`.
    ///
    /// Boundary condition: an entry aged exactly `max_age` is still valid; it
    /// expires only once its age strictly exceeds `max_age`. A zero `max_age`
    /// disables age-based expiry.
    pub fn is_expired_at(&self, max_age: Duration, now: Instant) -> bool {
        !max_age.is_zero() && self.age_at(now) > max_age
    }

    /// Checks expiry against the current monotonic time.
    pub fn is_expired(&self, max_age: Duration) -> bool {
        self.is_expired_at(max_age, Instant::now())
    }
}
