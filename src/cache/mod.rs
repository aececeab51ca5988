//! Session-scoped query cache for search results
//!
//! Search pages are stored in the session key-value store under
//! `movie:<encoded term>` with a timestamp, expire after an hour and are
//! bounded to a fixed number of entries. Concurrent identical API calls are
//! collapsed by [`inflight::InFlight`].

pub mod client;
pub mod inflight;
pub mod key;
pub mod query;

use std::time::Duration;

/// Cache TTL and capacity limits
pub struct CacheLimits;

impl CacheLimits {
    /// How long a cached search page stays valid
    pub const SEARCH_TTL: Duration = Duration::from_secs(60 * 60); // 1 hr

    /// Maximum number of `movie:` entries kept in the session scope
    pub const MAX_ENTRIES: usize = 50;
}

// Re-export main types
pub use client::CachedMovieClient;
pub use key::{fold_title, normalize_key};
pub use query::QueryCache;
