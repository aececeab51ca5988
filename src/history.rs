//! Search history persisted in the durable store
//!
//! Most recent first, capped, with titles compared case- and
//! accent-insensitively. Selecting an entry leaves a pending search term
//! that the next query-less `search` picks up.

use std::sync::Arc;

use serde_json::Value;

use crate::cache::fold_title;
use crate::store::KeyValueStore;

/// Durable key of the history list
pub const HISTORY_KEY: &str = "historialBusquedas";

/// Durable key of the pending navigation search
pub const NAVIGATE_KEY: &str = "tmdb.navigateSearch";

/// Maximum number of remembered searches
pub const MAX_HISTORY: usize = 10;

pub struct SearchHistory {
    store: Arc<dyn KeyValueStore>,
}

impl SearchHistory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Remembered titles, most recent first
    pub fn list(&self) -> Vec<String> {
        let raw = match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::warn!("Could not read search history: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(values)) => values
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Ok(_) => Vec::new(),
            Err(e) => {
                log::warn!("Search history is corrupt, discarding it: {}", e);
                self.purge(HISTORY_KEY);
                Vec::new()
            }
        }
    }

    /// Put `title` at the front, dropping any equivalent older entry
    pub fn record(&self, title: &str) -> Vec<String> {
        let title = title.trim();
        let mut list = self.list();
        if title.is_empty() {
            return list;
        }

        let folded = fold_title(title);
        list.retain(|existing| fold_title(existing) != folded);
        list.insert(0, title.to_string());
        list.truncate(MAX_HISTORY);
        self.save(&list);
        list
    }

    pub fn clear(&self) {
        self.purge(HISTORY_KEY);
    }

    /// Mark the entry at `index` (0-based) as the next search to run
    pub fn select(&self, index: usize) -> Option<String> {
        let title = self.list().into_iter().nth(index)?;
        if let Err(e) = self.store.set(NAVIGATE_KEY, &title) {
            log::warn!("Could not save pending search: {}", e);
        }
        Some(title)
    }

    /// Consume the pending navigation search, if any
    pub fn take_pending(&self) -> Option<String> {
        let term = self.store.get(NAVIGATE_KEY).ok().flatten()?;
        self.purge(NAVIGATE_KEY);
        let term = term.trim().to_string();
        (!term.is_empty()).then_some(term)
    }

    fn save(&self, list: &[String]) {
        let json = match serde_json::to_string(list) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Could not encode search history: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(HISTORY_KEY, &json) {
            log::warn!("Could not save search history: {}", e);
            self.purge(HISTORY_KEY);
        }
    }

    fn purge(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            log::debug!("Could not remove {}: {}", key, e);
        }
    }
}
