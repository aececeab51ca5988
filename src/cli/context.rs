//! Command execution context
//!
//! Provides a unified context for command execution: the resolved
//! configuration, the two storage scopes and, for online commands, the
//! cached metadata client.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use crate::cache::{CachedMovieClient, QueryCache};
use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::client::{ApiResult, TmdbClient};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::Result;
use crate::history::SearchHistory;
use crate::output::Spinner;
use crate::session::{CancelPolicy, SearchSession};
use crate::store::{KeyValueStore, MemoryStore, STORE_QUOTA_BYTES, SqliteStore, StorePaths};
use crate::watched::WatchedStore;

/// The metadata client used by commands
pub type Client = CachedMovieClient<TmdbClient>;

/// Context for command execution containing config, stores, and runtime options.
pub struct CommandContext {
    /// Configuration with CLI and environment overrides applied
    pub config: Config,
    /// Output format preference
    pub format: OutputFormat,
    /// Where the storage scopes live
    pub paths: StorePaths,
    /// Session scope: query cache, last browsed genre
    pub session_store: Arc<dyn KeyValueStore>,
    /// Durable scope: watched list, history
    pub durable_store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
    no_cache: bool,
}

impl CommandContext {
    /// Load config and open both stores.
    ///
    /// A missing config file is fine here; commands that talk to the API ask
    /// for the key through [`client`](Self::client).
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let mut config = Config::load_or_default(opts.config_ref())?;

        if let Some(key) = &opts.api_key {
            config.api_key = Some(key.clone());
        }
        if let Some(base) = &opts.api_base {
            config.api_base = Some(base.clone());
        }

        let format = opts
            .format
            .or_else(|| {
                config
                    .preferences
                    .format
                    .as_deref()
                    .and_then(OutputFormat::from_preference)
            })
            .unwrap_or_default();

        let paths = StorePaths::resolve()?;
        let session_store = open_store(&paths.session, "session");
        let durable_store = open_store(&paths.durable, "durable");

        Ok(Self {
            config,
            format,
            paths,
            session_store,
            durable_store,
            clock: Arc::new(SystemClock),
            no_cache: opts.no_cache,
        })
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Session query cache over the session store
    pub fn query_cache(&self) -> QueryCache {
        QueryCache::new(self.session_store.clone(), self.clock.clone())
    }

    pub fn watched(&self) -> WatchedStore {
        WatchedStore::new(self.durable_store.clone())
            .with_undo_window(self.config.preferences.undo_window())
    }

    pub fn history(&self) -> SearchHistory {
        SearchHistory::new(self.durable_store.clone())
    }

    /// Metadata client with caching; fails with `MissingApiKey` when no key
    /// is configured
    pub fn client(&self) -> Result<Arc<Client>> {
        let api_key = self.config.require_api_key()?.to_string();
        let inner = TmdbClient::new(api_key, self.config.client_settings())?;
        let cache = (!self.no_cache).then(|| self.query_cache());
        Ok(Arc::new(CachedMovieClient::new(inner, cache)))
    }

    /// Search session over a fresh client
    pub fn session(&self) -> Result<SearchSession<TmdbClient>> {
        Ok(SearchSession::new(self.client()?, self.history())
            .with_deadline(self.config.preferences.request_timeout()))
    }

    /// Run one API request under the configured deadline with a spinner
    pub async fn fetch<T, F>(&self, message: &str, request: F) -> Result<T>
    where
        F: Future<Output = ApiResult<T>>,
    {
        let deadline = self.config.preferences.request_timeout();
        let (_, token) = CancelPolicy::new(deadline).begin_primary();

        let spinner = Spinner::start(message, self.format);
        let result = token.run(deadline, request).await;
        spinner.finish();

        Ok(result?)
    }
}

/// Open a SQLite store, falling back to memory so that storage problems never
/// stop a command
fn open_store(path: &Path, scope: &str) -> Arc<dyn KeyValueStore> {
    match SqliteStore::open_at(path) {
        Ok(store) => Arc::new(store.with_quota(STORE_QUOTA_BYTES)),
        Err(e) => {
            log::warn!(
                "Could not open {} store at {} ({}); changes will not be kept",
                scope,
                path.display(),
                e
            );
            Arc::new(MemoryStore::new())
        }
    }
}
