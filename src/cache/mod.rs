//! Cache Module
//!
//! Provides an in-memory cache whose entries lapse after a fixed max age.

mod entry;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use store::{CacheStats, ExpiringCache};

// == Public Constants ==
/// Default max age, in seconds, for cached Hub verdicts
pub const DEFAULT_MAX_AGE_SECS: u64 = 300;
