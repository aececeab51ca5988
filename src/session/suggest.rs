//! Title suggestions memoized per normalized term

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::client::Movie;

/// Suggestions shown per term
pub const MAX_SUGGESTIONS: usize = 6;

/// Terms remembered before the oldest is forgotten
pub const MEMO_CAPACITY: usize = 200;

/// Shortest normalized term that triggers a lookup
pub const MIN_SUGGEST_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    pub year: String,
    pub id: Option<i64>,
}

impl From<&Movie> for Suggestion {
    fn from(movie: &Movie) -> Self {
        Self {
            title: movie.title.clone(),
            year: movie.year.clone(),
            id: movie.tmdb_id,
        }
    }
}

/// First-in first-out memo of suggestion lists
#[derive(Debug, Default)]
pub struct SuggestionMemo {
    entries: HashMap<String, Vec<Suggestion>>,
    order: VecDeque<String>,
}

impl SuggestionMemo {
    pub fn get(&self, key: &str) -> Option<Vec<Suggestion>> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: String, suggestions: Vec<Suggestion>) {
        if self.entries.insert(key.clone(), suggestions).is_none() {
            self.order.push_back(key);
        }
        while self.order.len() > MEMO_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
