//! Watched-movie list persisted in the durable store
//!
//! The list lives under a single key as a JSON array, most recent first.
//! Every operation reads the whole list, modifies it and writes it back.
//! Unreadable data is purged and treated as an empty list; failed writes are
//! logged and otherwise ignored.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::models::PLACEHOLDER_POSTER;
use crate::client::{ApiResult, Movie, MovieApi};
use crate::identity::{self, ButtonState, MovieRef};
use crate::store::KeyValueStore;

/// Durable key of the watched list
pub const WATCHED_KEY: &str = "watchedMovies";

/// Durable key of the most recent undoable deletion
pub const PENDING_UNDO_KEY: &str = "watched.pendingUndo";

/// Default time during which a deletion can be undone
pub const DEFAULT_UNDO_WINDOW: Duration = Duration::from_secs(6);

/// Synopsis preview length for detail views
pub const SYNOPSIS_PREVIEW_CHARS: usize = 300;

/// One watched movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedItem {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub year: String,

    #[serde(default)]
    pub poster: String,

    /// Epoch milliseconds
    #[serde(default)]
    pub viewed_at: i64,

    /// 0-10, unset when the user has not rated
    #[serde(default)]
    pub rating: Option<f64>,

    #[serde(default)]
    pub note: String,

    /// The record the item was created from
    #[serde(default)]
    pub source_data: Value,
}

impl WatchedItem {
    /// Build an item for a movie seen at `now`
    pub fn from_movie(movie: &Movie, now: i64) -> Self {
        let source_data = serde_json::to_value(movie).unwrap_or(Value::Null);
        let id = identity::identify(&source_data)
            .canonical_id
            .unwrap_or_else(|| movie.id.clone());

        Self {
            id,
            title: movie.title.clone(),
            year: movie.year.clone(),
            poster: movie.poster.clone(),
            viewed_at: now,
            rating: None,
            note: String::new(),
            source_data,
        }
    }

    /// Synopsis carried by the source record, if any
    pub fn synopsis(&self) -> Option<String> {
        ["Plot", "plot", "Overview", "overview"]
            .iter()
            .filter_map(|key| self.source_data.get(*key))
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|s| !s.is_empty() && *s != "N/A")
            .map(str::to_string)
    }

    /// Synopsis cut to the preview length with an ellipsis
    pub fn synopsis_preview(&self) -> Option<String> {
        self.synopsis().map(|s| {
            if s.chars().count() > SYNOPSIS_PREVIEW_CHARS {
                let cut: String = s.chars().take(SYNOPSIS_PREVIEW_CHARS).collect();
                format!("{}…", cut)
            } else {
                s
            }
        })
    }

    /// Trim text fields and substitute the placeholder poster
    fn normalized(mut self) -> Self {
        self.id = self.id.trim().to_string();
        self.title = self.title.trim().to_string();
        self.year = self.year.trim().to_string();
        if self.poster.trim().is_empty() || self.poster == "N/A" {
            self.poster = PLACEHOLDER_POSTER.to_string();
        } else {
            self.poster = self.poster.trim().to_string();
        }
        self
    }
}

/// Partial update of a watched item; `None` fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct WatchedPatch {
    pub rating: Option<Option<f64>>,
    pub note: Option<String>,
    pub source_data: Option<Value>,
}

/// Tombstone of the most recent deletion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PendingDeletion {
    item: WatchedItem,
    deleted_at: i64,
}

/// Watched list over a durable key-value store
pub struct WatchedStore {
    store: Arc<dyn KeyValueStore>,
    undo_window: Duration,
}

impl WatchedStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            undo_window: DEFAULT_UNDO_WINDOW,
        }
    }

    pub fn with_undo_window(mut self, window: Duration) -> Self {
        self.undo_window = window;
        self
    }

    pub fn undo_window(&self) -> Duration {
        self.undo_window
    }

    /// All items, most recent first
    pub fn list(&self) -> Vec<WatchedItem> {
        let raw = match self.store.get(WATCHED_KEY) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return Vec::new(),
            Err(e) => {
                log::warn!("Could not read watched list: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(values)) => values
                .into_iter()
                .filter_map(|v| match serde_json::from_value::<WatchedItem>(v) {
                    Ok(item) => Some(item),
                    Err(e) => {
                        log::debug!("Skipping unreadable watched item: {}", e);
                        None
                    }
                })
                .collect(),
            Ok(_) => Vec::new(),
            Err(e) => {
                log::warn!("Watched list is corrupt, discarding it: {}", e);
                self.purge(WATCHED_KEY);
                Vec::new()
            }
        }
    }

    /// Item with exactly this id
    pub fn get(&self, id: &str) -> Option<WatchedItem> {
        let id = id.trim();
        self.list().into_iter().find(|item| item.id == id)
    }

    /// Item matching a user-supplied reference: an exact id, or any id
    /// form accepted by [`MovieRef::parse`] that identifies the same movie
    pub fn find(&self, reference: &str) -> Option<WatchedItem> {
        if let Some(item) = self.get(reference) {
            return Some(item);
        }
        let record = MovieRef::parse(reference)?.as_record();
        self.list()
            .into_iter()
            .find(|item| identity::is_watched(&record, std::slice::from_ref(item)))
    }

    /// Record a movie as watched at `now`
    pub fn mark(&self, movie: &Movie, now: i64) -> WatchedItem {
        let item = WatchedItem::from_movie(movie, now).normalized();
        self.add(item.clone());
        item
    }

    /// Insert an item at the front, replacing any item with the same id
    pub fn add(&self, item: WatchedItem) -> Vec<WatchedItem> {
        let item = item.normalized();
        let mut list = self.list();
        if item.id.is_empty() {
            log::debug!("Ignoring watched item without id");
            return list;
        }

        list.retain(|existing| existing.id != item.id);
        list.insert(0, item);
        self.save(&list);
        list
    }

    /// Apply a patch to the item with `id`
    pub fn update(&self, id: &str, patch: WatchedPatch) -> Option<WatchedItem> {
        let id = id.trim();
        let mut list = self.list();
        let item = list.iter_mut().find(|item| item.id == id)?;

        if let Some(rating) = patch.rating {
            item.rating = rating;
        }
        if let Some(note) = patch.note {
            item.note = note;
        }
        if let Some(source_data) = patch.source_data {
            item.source_data = source_data;
        }

        let updated = item.clone();
        self.save(&list);
        Some(updated)
    }

    /// Delete the item with `id`, returning the remaining list
    pub fn remove(&self, id: &str) -> Vec<WatchedItem> {
        let id = id.trim();
        let mut list = self.list();
        let before = list.len();
        list.retain(|item| item.id != id);
        if list.len() != before {
            self.save(&list);
        }
        list
    }

    /// Delete the item with `id` and remember it for [`undo`](Self::undo)
    pub fn remove_with_undo(&self, id: &str, now: i64) -> Option<WatchedItem> {
        let item = self.get(id)?;
        self.remove(&item.id);

        let pending = PendingDeletion {
            item: item.clone(),
            deleted_at: now,
        };
        match serde_json::to_string(&pending) {
            Ok(json) => {
                if let Err(e) = self.store.set(PENDING_UNDO_KEY, &json) {
                    log::warn!("Could not save undo information: {}", e);
                }
            }
            Err(e) => log::warn!("Could not encode undo information: {}", e),
        }
        Some(item)
    }

    /// Restore the most recent deletion if it is still within the window.
    ///
    /// The item keeps its original `viewedAt` and is appended at the end. If
    /// an item with the same id was added meanwhile, nothing changes.
    pub fn undo(&self, now: i64) -> Option<WatchedItem> {
        let raw = self.store.get(PENDING_UNDO_KEY).ok().flatten()?;
        self.purge(PENDING_UNDO_KEY);

        let pending: PendingDeletion = match serde_json::from_str(&raw) {
            Ok(pending) => pending,
            Err(e) => {
                log::debug!("Discarding unreadable undo information: {}", e);
                return None;
            }
        };

        let elapsed = now.saturating_sub(pending.deleted_at);
        if elapsed < 0 || elapsed as u128 > self.undo_window.as_millis() {
            log::debug!("Undo window for {} has passed", pending.item.id);
            return None;
        }

        let mut list = self.list();
        if list.iter().any(|item| item.id == pending.item.id) {
            return None;
        }
        list.push(pending.item.clone());
        self.save(&list);
        Some(pending.item)
    }

    /// Whether `record` refers to a watched movie
    #[allow(dead_code)]
    pub fn is_watched(&self, record: &Value) -> bool {
        identity::is_watched(record, &self.list())
    }

    pub fn button_state(&self, record: &Value) -> ButtonState {
        identity::reconcile_button_state(&self.list(), record)
    }

    /// Fetch fresh metadata for an item and store it as its source record.
    ///
    /// Uses the catalog id when the item has one, otherwise resolves the
    /// legacy id. Returns `Ok(None)` when the item does not exist.
    pub async fn enrich<A: MovieApi + ?Sized>(
        &self,
        id: &str,
        api: &A,
    ) -> ApiResult<Option<WatchedItem>> {
        let Some(item) = self.get(id) else {
            return Ok(None);
        };

        let mut ids = identity::identify(&item.source_data);
        if !ids.is_stable() {
            ids = identity::identify(&serde_json::to_value(&item).unwrap_or(Value::Null));
        }

        let reference = ids
            .catalog_id
            .as_deref()
            .and_then(MovieRef::parse)
            .or_else(|| ids.legacy_id.as_deref().and_then(MovieRef::parse));

        let fetched = match reference {
            Some(MovieRef::Catalog(tmdb_id)) => Some(api.movie(tmdb_id).await?),
            Some(MovieRef::Legacy(imdb_id)) => api.find_by_external_id(&imdb_id).await?,
            None => {
                log::debug!("No stable id to enrich {}", item.id);
                None
            }
        };

        let Some(movie) = fetched else {
            return Ok(Some(item));
        };

        let source_data = serde_json::to_value(&movie).unwrap_or(Value::Null);
        Ok(self.update(
            &item.id,
            WatchedPatch {
                source_data: Some(source_data),
                ..WatchedPatch::default()
            },
        ))
    }

    fn save(&self, list: &[WatchedItem]) {
        let json = match serde_json::to_string(list) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Could not encode watched list: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(WATCHED_KEY, &json) {
            log::warn!("Could not save watched list: {}", e);
            self.purge(WATCHED_KEY);
        }
    }

    fn purge(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            log::debug!("Could not remove {}: {}", key, e);
        }
    }
}
