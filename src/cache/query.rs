//! Timestamped search-result cache over a key-value store
//!
//! Entries are JSON `{"data": ..., "ts": <epoch ms>}`. Reads evict lazily:
//! expired or unparseable entries are removed when encountered. Writes are
//! followed by a capacity check that drops the oldest entries first.
//!
//! No storage failure ever escapes this module; an unavailable store simply
//! behaves as an always-empty cache.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::CacheLimits;
use super::key::{CACHE_PREFIX, storage_key};
use crate::clock::Clock;
use crate::error::{SearchError, StorageError};
use crate::store::KeyValueStore;

#[derive(Serialize)]
struct StoredEntry<'a, T: Serialize> {
    data: &'a T,
    ts: i64,
}

#[derive(Deserialize)]
struct RawEntry {
    data: Value,
    #[serde(default)]
    ts: Value,
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub oldest_ts: Option<i64>,
    pub newest_ts: Option<i64>,
}

/// Search-page cache keyed by normalized title
pub struct QueryCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl_ms: i64,
    max_entries: usize,
}

impl QueryCache {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            ttl_ms: CacheLimits::SEARCH_TTL.as_millis() as i64,
            max_entries: CacheLimits::MAX_ENTRIES,
        }
    }

    /// Override the entry bound (tests use small bounds)
    #[cfg(test)]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Look up a payload by normalized key.
    ///
    /// Returns `None` on a miss, on expiry and on any parse failure; the two
    /// latter cases also remove the stored entry.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let skey = storage_key(key);
        let raw = match self.store.get(&skey) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::debug!("Cache read failed for {}: {}", skey, e);
                return None;
            }
        };

        let entry = match serde_json::from_str::<RawEntry>(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Dropping unparseable cache entry {}: {}", skey, e);
                self.discard(&skey);
                return None;
            }
        };

        let Some(ts) = entry_ts(&entry.ts) else {
            log::debug!("Dropping cache entry without timestamp: {}", skey);
            self.discard(&skey);
            return None;
        };

        if self.clock.now_ms() - ts > self.ttl_ms {
            log::debug!("Cache entry expired: {}", skey);
            self.discard(&skey);
            return None;
        }

        match serde_json::from_value(entry.data) {
            Ok(payload) => {
                log::debug!("Cache hit: {}", skey);
                Some(payload)
            }
            Err(e) => {
                log::debug!("Dropping cache entry with unexpected shape {}: {}", skey, e);
                self.discard(&skey);
                None
            }
        }
    }

    /// Store a payload under a normalized key with the current timestamp.
    pub fn put<T: Serialize>(&self, key: &str, payload: &T) {
        let skey = storage_key(key);
        let json = match serde_json::to_string(&StoredEntry {
            data: payload,
            ts: self.clock.now_ms(),
        }) {
            Ok(json) => json,
            Err(e) => {
                log::debug!("Skipping cache write for {}: {}", skey, e);
                return;
            }
        };

        match self.store.set(&skey, &json) {
            Ok(()) => self.evict_if_over_capacity(),
            Err(StorageError::QuotaExceeded) => {
                log::debug!("Storage quota exceeded writing {}, evicting and retrying", skey);
                self.evict_expired();
                self.evict_if_over_capacity();
                if let Err(e) = self.store.set(&skey, &json) {
                    log::debug!(
                        "Cache write for {} failed after eviction: {}",
                        skey,
                        SearchError::from(e)
                    );
                }
            }
            Err(e) => log::debug!("Cache write for {} failed: {}", skey, SearchError::from(e)),
        }
    }

    /// Drop the oldest entries until at most `max_entries` remain.
    ///
    /// Entries that cannot be parsed sort as `ts = 0` and go first.
    pub fn evict_if_over_capacity(&self) {
        let mut entries = self.timestamps();
        if entries.len() <= self.max_entries {
            return;
        }

        entries.sort_by_key(|(_, ts)| *ts);
        let excess = entries.len() - self.max_entries;
        for (key, _) in entries.into_iter().take(excess) {
            log::debug!("Evicting cache entry: {}", key);
            self.discard(&key);
        }
    }

    /// Remove every expired or unparseable entry
    fn evict_expired(&self) {
        let now = self.clock.now_ms();
        for (key, ts) in self.timestamps() {
            if now - ts > self.ttl_ms {
                self.discard(&key);
            }
        }
    }

    /// Entry counts and timestamp range
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_ms();
        let entries = self.timestamps();

        let valid = entries
            .iter()
            .filter(|(_, ts)| now - ts <= self.ttl_ms)
            .count();

        CacheStats {
            total_entries: entries.len(),
            valid_entries: valid,
            expired_entries: entries.len() - valid,
            oldest_ts: entries.iter().map(|(_, ts)| *ts).filter(|ts| *ts > 0).min(),
            newest_ts: entries.iter().map(|(_, ts)| *ts).max().filter(|ts| *ts > 0),
        }
    }

    /// Remove all cache entries, returning how many were removed
    pub fn clear(&self) -> usize {
        let keys = self.cache_keys();
        for key in &keys {
            self.discard(key);
        }
        keys.len()
    }

    fn cache_keys(&self) -> Vec<String> {
        match self.store.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| k.starts_with(CACHE_PREFIX))
                .collect(),
            Err(e) => {
                log::debug!("Cache key listing failed: {}", e);
                Vec::new()
            }
        }
    }

    fn timestamps(&self) -> Vec<(String, i64)> {
        self.cache_keys()
            .into_iter()
            .map(|key| {
                let ts = self
                    .store
                    .get(&key)
                    .ok()
                    .flatten()
                    .and_then(|raw| serde_json::from_str::<RawEntry>(&raw).ok())
                    .and_then(|entry| entry_ts(&entry.ts))
                    .unwrap_or(0);
                (key, ts)
            })
            .collect()
    }

    fn discard(&self, skey: &str) {
        if let Err(e) = self.store.remove(skey) {
            log::debug!("Failed to remove cache entry {}: {}", skey, e);
        }
    }
}

fn entry_ts(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
}
