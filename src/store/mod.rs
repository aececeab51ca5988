//! Key-value storage behind the session cache and the durable user state
//!
//! There are two scopes: a session scope for disposable
//! data (query cache, last genre) and a durable scope for user data (watched
//! list, search history). Both are plain string key-value stores with no
//! transactional guarantees; callers read-modify-write whole values.

pub mod memory;
pub mod sqlite;

use std::path::PathBuf;

use crate::error::StorageError;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Byte cap applied to each SQLite scope
pub const STORE_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Environment variable that relocates both scopes under one directory
pub const DATA_DIR_ENV: &str = "CINETRACK_DATA_DIR";

/// Minimal key-value port. Values are JSON text.
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `Ok(None)` when absent
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// All keys currently stored
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Resolved on-disk locations of the two storage scopes
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub session: PathBuf,
    pub durable: PathBuf,
}

impl StorePaths {
    /// Default locations: session data under the XDG cache dir, durable data
    /// under the XDG data dir. `CINETRACK_DATA_DIR` overrides both.
    pub fn resolve() -> Result<Self, StorageError> {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            return Ok(Self::under(PathBuf::from(dir)));
        }

        let cache_base = dirs::cache_dir()
            .ok_or_else(|| StorageError::Unavailable("no cache directory".to_string()))?;
        let data_base = dirs::data_dir()
            .ok_or_else(|| StorageError::Unavailable("no data directory".to_string()))?;

        Ok(Self {
            session: cache_base.join("cinetrack").join("session.db"),
            durable: data_base.join("cinetrack").join("state.db"),
        })
    }

    /// Both scopes inside a single directory
    pub fn under(dir: PathBuf) -> Self {
        Self {
            session: dir.join("session.db"),
            durable: dir.join("state.db"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_paths_under_dir() {
        let paths = StorePaths::under(PathBuf::from("/tmp/ct"));
        assert_eq!(paths.session, PathBuf::from("/tmp/ct/session.db"));
        assert_eq!(paths.durable, PathBuf::from("/tmp/ct/state.db"));
    }
}
