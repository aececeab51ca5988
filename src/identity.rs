//! Movie identity resolution
//!
//! Records reach the watched list in several shapes: legacy OMDb-style
//! objects, catalog results, normalized [`Movie`](crate::client::Movie)
//! values with the original under `raw`, and stored watched items with the
//! original under `sourceData`. This module derives comparable identifiers
//! from any of them.
//!
//! Precedence for the canonical id is legacy (IMDb) id, then catalog id,
//! then `"<title>::<year>"`. Title/year is only a fallback for records that
//! carry neither stable id.

use serde::Serialize;
use serde_json::{Value, json};

use crate::watched::WatchedItem;

/// Prefix of catalog identifiers
pub const CATALOG_PREFIX: &str = "tmdb:";

/// Identifiers derived from one record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub legacy_id: Option<String>,
    pub catalog_id: Option<String>,
    pub title_year_key: Option<String>,
    pub canonical_id: Option<String>,
}

impl Identity {
    /// True when the record has a legacy or catalog id
    pub fn is_stable(&self) -> bool {
        self.legacy_id.is_some() || self.catalog_id.is_some()
    }
}

/// Whether a record can still be marked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ButtonState {
    MarkAsWatched,
    AlreadyWatched,
}

impl std::fmt::Display for ButtonState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ButtonState::MarkAsWatched => write!(f, "not watched"),
            ButtonState::AlreadyWatched => write!(f, "watched"),
        }
    }
}

/// A user-supplied movie reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieRef {
    /// Catalog id, given as `603` or `tmdb:603`
    Catalog(i64),
    /// IMDb id such as `tt0111161`
    Legacy(String),
}

impl MovieRef {
    /// Parse `tt…`, `tmdb:<n>` or a bare number
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if is_legacy_id(input) {
            return Some(MovieRef::Legacy(input.to_string()));
        }
        let digits = input.strip_prefix(CATALOG_PREFIX).unwrap_or(input);
        if is_digits(digits) {
            return digits.parse().ok().map(MovieRef::Catalog);
        }
        None
    }

    /// Minimal record carrying only this reference, for identity checks
    pub fn as_record(&self) -> Value {
        match self {
            MovieRef::Catalog(id) => json!({ "tmdb_id": id }),
            MovieRef::Legacy(id) => json!({ "imdbID": id }),
        }
    }
}

/// Derive all identifiers of a record
pub fn identify(record: &Value) -> Identity {
    let raw = record.get("raw");

    let legacy_id = [
        record.get("imdbID"),
        record.get("imdb_id"),
        raw.and_then(|r| r.get("imdb_id")),
        raw.and_then(|r| r.get("imdbID")),
    ]
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
    .map(str::trim)
    .find(|id| is_legacy_id(id))
    .map(str::to_string);

    let catalog_id = catalog_number(record)
        .or_else(|| raw.and_then(catalog_number))
        .map(|n| format!("{}{}", CATALOG_PREFIX, n));

    let normalized = record.get("_normalized");
    let title = first_text(&[
        record.get("Title"),
        record.get("title"),
        record.get("name"),
        normalized.and_then(|n| n.get("Title")),
        raw.and_then(|r| r.get("title")),
        raw.and_then(|r| r.get("name")),
    ]);
    let release_year = raw
        .and_then(|r| r.get("release_date"))
        .and_then(text)
        .map(|date| date.chars().take(4).collect::<String>());
    let year = first_text(&[
        record.get("Year"),
        record.get("year"),
        normalized.and_then(|n| n.get("Year")),
    ])
    .or(release_year)
    .or_else(|| first_text(&[raw.and_then(|r| r.get("year"))]));

    let title_year_key = match (title, year) {
        (Some(title), Some(year)) => Some(format!("{}::{}", title, year)),
        _ => None,
    };

    let canonical_id = legacy_id
        .clone()
        .or_else(|| catalog_id.clone())
        .or_else(|| title_year_key.clone());

    Identity {
        legacy_id,
        catalog_id,
        title_year_key,
        canonical_id,
    }
}

/// Whether `record` refers to any item of `collection`
pub fn is_watched(record: &Value, collection: &[WatchedItem]) -> bool {
    let ids = identify(record);
    if ids.canonical_id.is_none() {
        return false;
    }
    collection.iter().any(|item| item_matches(&ids, item))
}

/// Pure mapping from collection membership to the mark button state
pub fn reconcile_button_state(collection: &[WatchedItem], record: &Value) -> ButtonState {
    if is_watched(record, collection) {
        ButtonState::AlreadyWatched
    } else {
        ButtonState::MarkAsWatched
    }
}

fn item_matches(ids: &Identity, item: &WatchedItem) -> bool {
    let stable = ids.is_stable();
    let own = normalize(&item.id);
    if !own.is_empty() {
        let direct = [&ids.legacy_id, &ids.catalog_id]
            .into_iter()
            .flatten()
            .any(|id| normalize(id) == own);
        let by_title = !stable
            && ids
                .title_year_key
                .as_ref()
                .is_some_and(|key| normalize(key) == own);
        let by_suffix = ids.catalog_id.as_deref().is_some_and(|id| {
            let suffix = catalog_suffix(&own);
            is_digits(suffix) && catalog_suffix(id) == suffix
        });
        if direct || by_title || by_suffix {
            return true;
        }
    }

    let from_source = identify(&item.source_data);
    if identities_match(ids, &from_source, stable) {
        return true;
    }

    match serde_json::to_value(item) {
        Ok(value) => identities_match(ids, &identify(&value), stable),
        Err(_) => false,
    }
}

fn identities_match(ids: &Identity, other: &Identity, stable: bool) -> bool {
    let same = |a: &Option<String>, b: &Option<String>| match (a, b) {
        (Some(a), Some(b)) => normalize(a) == normalize(b),
        _ => false,
    };

    same(&ids.legacy_id, &other.legacy_id)
        || same(&ids.catalog_id, &other.catalog_id)
        || (!stable && same(&ids.title_year_key, &other.title_year_key))
}

/// Numeric catalog id carried by `tmdb_id` or `id`
fn catalog_number(record: &Value) -> Option<String> {
    [record.get("tmdb_id"), record.get("id")]
        .into_iter()
        .flatten()
        .find_map(|value| match value {
            Value::Number(n) => n.as_u64().map(|n| n.to_string()),
            Value::String(s) => {
                let s = s.trim();
                let digits = s.strip_prefix(CATALOG_PREFIX).unwrap_or(s);
                is_digits(digits).then(|| digits.to_string())
            }
            _ => None,
        })
}

/// Trimmed non-empty text of a string or number value
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_text(candidates: &[Option<&Value>]) -> Option<String> {
    candidates.iter().flatten().find_map(|v| text(v))
}

fn normalize(id: &str) -> String {
    id.trim().to_lowercase()
}

fn catalog_suffix(id: &str) -> &str {
    id.strip_prefix(CATALOG_PREFIX).unwrap_or(id)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `tt` followed by digits
pub fn is_legacy_id(id: &str) -> bool {
    id.strip_prefix("tt").is_some_and(is_digits)
}
