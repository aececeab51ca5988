//! Search session: the state behind one user's searching
//!
//! Owns the current term and loading flag, the cancellation policy, the
//! suggestion memo and the search history, and routes searches through the
//! cached client.

pub mod cancel;
pub mod suggest;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;

use crate::cache::{CachedMovieClient, fold_title, normalize_key};
use crate::client::{MovieApi, SearchPage};
use crate::error::SearchError;
use crate::history::SearchHistory;

pub use cancel::{CancelPolicy, DEFAULT_DEADLINE};
pub use suggest::{MAX_SUGGESTIONS, MIN_SUGGEST_CHARS, Suggestion, SuggestionMemo};

/// Quiet period before typed text triggers a search
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(600);

/// Shortest typed term that triggers an automatic search
pub const MIN_AUTO_SEARCH_CHARS: usize = 4;

/// A successful search
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub term: String,
    pub page: SearchPage,
    /// Served from the session cache without a request
    pub from_cache: bool,
}

#[derive(Debug, Default)]
struct SessionState {
    current_term: Option<String>,
    loading: bool,
    search_generation: u64,
    typing_generation: u64,
}

pub struct SearchSession<C: MovieApi> {
    client: Arc<CachedMovieClient<C>>,
    history: SearchHistory,
    policy: CancelPolicy,
    suggestions: Mutex<SuggestionMemo>,
    state: Mutex<SessionState>,
    debounce: Duration,
}

impl<C: MovieApi + 'static> SearchSession<C> {
    pub fn new(client: Arc<CachedMovieClient<C>>, history: SearchHistory) -> Self {
        Self {
            client,
            history,
            policy: CancelPolicy::new(DEFAULT_DEADLINE),
            suggestions: Mutex::new(SuggestionMemo::default()),
            state: Mutex::new(SessionState::default()),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Deadline applied to each request
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.policy = CancelPolicy::new(deadline);
        self
    }

    pub fn current_term(&self) -> Option<String> {
        self.state().current_term.clone()
    }

    #[allow(dead_code)]
    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    /// Search for `term`, first page
    pub async fn search(&self, term: &str) -> Result<SearchOutcome, SearchError> {
        self.search_page(term, 1).await
    }

    /// Search for `term` and return page `page`.
    ///
    /// A cached first page is returned without a request. Otherwise the
    /// previous search is cancelled and a new request runs under the session
    /// deadline; a response that arrives after the term changed is dropped.
    pub async fn search_page(&self, term: &str, page: u32) -> Result<SearchOutcome, SearchError> {
        let term = term.trim();
        let key = normalize_key(term).ok_or(SearchError::InputEmpty)?;

        if page == 1
            && let Some(cached) = self.client.cached_search(&key)
        {
            log::debug!("Serving '{}' from the session cache", term);
            let (token_id, _) = self.policy.begin_primary();
            self.policy.finish_primary(token_id);
            {
                let mut state = self.state();
                state.search_generation += 1;
                state.current_term = Some(term.to_string());
                state.loading = false;
            }
            self.history.record(term);
            return Ok(SearchOutcome {
                term: term.to_string(),
                page: cached,
                from_cache: true,
            });
        }

        let (token_id, token) = self.policy.begin_primary();
        let generation = {
            let mut state = self.state();
            state.search_generation += 1;
            state.current_term = Some(term.to_string());
            state.loading = true;
            state.search_generation
        };

        let result = token
            .run(self.policy.deadline(), self.client.fetch_search(term, page))
            .await;
        self.policy.finish_primary(token_id);

        let superseded = {
            let mut state = self.state();
            let superseded = state.search_generation != generation;
            if !superseded {
                state.loading = false;
            }
            superseded
        };

        if superseded || self.current_term().as_deref() != Some(term) {
            log::debug!("Dropping stale response for '{}'", term);
            return Err(SearchError::UserCancelled);
        }
        let result = result.map_err(SearchError::from)?;
        if result.results.is_empty() {
            return Err(SearchError::NotFound);
        }

        self.history.record(term);
        Ok(SearchOutcome {
            term: term.to_string(),
            page: result,
            from_cache: false,
        })
    }

    /// Re-fetch a term that was served from cache and overwrite the entry
    /// when the result changed. Returns whether the cache was updated.
    ///
    /// Failures are logged and never reported.
    pub async fn refresh(&self, term: &str, cached: &SearchPage) -> bool {
        let term = term.trim();
        let Some(key) = normalize_key(term) else {
            return false;
        };

        let (token_id, token) = self.policy.begin_refresh();
        let result = token
            .run(
                self.policy.deadline(),
                self.client.fetch_search_uncached(term, 1),
            )
            .await;
        self.policy.finish_refresh(token_id);

        match result {
            Ok(fresh) => {
                if fresh.results.is_empty() || self.current_term().as_deref() != Some(term) {
                    return false;
                }
                if fresh == *cached {
                    log::debug!("Background refresh for '{}': unchanged", term);
                    return false;
                }
                self.client.store_search(&key, &fresh);
                log::debug!("Background refresh for '{}': cache updated", term);
                true
            }
            Err(e) => {
                log::debug!("Background refresh for '{}' failed: {}", term, e);
                false
            }
        }
    }

    /// Debounced automatic search for text as it is typed.
    ///
    /// Returns `None` when a later call superseded this one within the
    /// debounce period or when the text is too short to search.
    #[allow(dead_code)]
    pub async fn type_text(&self, text: &str) -> Option<Result<SearchOutcome, SearchError>> {
        let generation = {
            let mut state = self.state();
            state.typing_generation += 1;
            state.typing_generation
        };

        tokio::time::sleep(self.debounce).await;

        if self.state().typing_generation != generation {
            return None;
        }
        let term = text.trim();
        if term.chars().count() < MIN_AUTO_SEARCH_CHARS {
            return None;
        }
        Some(self.search(term).await)
    }

    /// Up to six title suggestions for a partial term.
    ///
    /// Failures and aborted lookups yield an empty list.
    pub async fn suggest(&self, text: &str) -> Vec<Suggestion> {
        let key = fold_title(text);
        if key.chars().count() < MIN_SUGGEST_CHARS {
            return Vec::new();
        }

        if let Some(hit) = self.memo().get(&key) {
            return hit;
        }

        let (token_id, token) = self.policy.begin_suggestion();
        let result = token
            .run(self.policy.deadline(), self.client.fetch_search(text, 1))
            .await;
        self.policy.finish_suggestion(token_id);

        match result {
            Ok(page) => {
                let suggestions: Vec<Suggestion> = page
                    .results
                    .iter()
                    .take(MAX_SUGGESTIONS)
                    .map(Suggestion::from)
                    .collect();
                self.memo().insert(key, suggestions.clone());
                suggestions
            }
            Err(e) => {
                log::debug!("Suggestion lookup for '{}' failed: {}", text.trim(), e);
                Vec::new()
            }
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn memo(&self) -> MutexGuard<'_, SuggestionMemo> {
        self.suggestions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::QueryCache;
    use crate::client::{Movie, MockMovieApi};
    use crate::clock::ManualClock;
    use crate::error::ApiError;
    use crate::store::MemoryStore;

    struct Fixture {
        session: SearchSession<MockMovieApi>,
        api: Arc<MockMovieApi>,
        history_store: Arc<MemoryStore>,
    }

    fn matrix() -> Movie {
        MockMovieApi::catalog(603, "The Matrix", "1999-03-30")
    }

    fn batman() -> Movie {
        MockMovieApi::catalog(268, "Batman", "1989-06-23")
    }

    async fn fixture(api: MockMovieApi, cached: bool) -> Fixture {
        let api = Arc::new(
            api.with_search("matrix", vec![matrix()])
                .await
                .with_search("batman", vec![batman()])
                .await,
        );
        let cache = cached.then(|| {
            QueryCache::new(
                Arc::new(MemoryStore::new()),
                Arc::new(ManualClock::new(1_700_000_000_000)),
            )
        });
        let client = Arc::new(CachedMovieClient::from_arc(api.clone(), cache));
        let history_store = Arc::new(MemoryStore::new());
        let session = SearchSession::new(client, SearchHistory::new(history_store.clone()));
        Fixture {
            session,
            api,
            history_store,
        }
    }

    #[tokio::test]
    async fn test_blank_term_is_input_empty() {
        let f = fixture(MockMovieApi::new(), true).await;
        assert_eq!(f.session.search("   ").await.unwrap_err(), SearchError::InputEmpty);
        assert_eq!(f.api.call_counts().await.search, 0);
    }

    #[tokio::test]
    async fn test_search_then_cache_hit() {
        let f = fixture(MockMovieApi::new(), true).await;

        let first = f.session.search("Matrix").await.unwrap();
        assert!(!first.from_cache);
        assert_eq!(first.page.results[0].id, "tmdb:603");

        let second = f.session.search(" MATRIX ").await.unwrap();
        assert!(second.from_cache);
        assert_eq!(second.page, first.page);
        assert_eq!(f.api.call_counts().await.search, 1);

        assert_eq!(f.session.current_term().as_deref(), Some("MATRIX"));
        assert!(!f.session.is_loading());
    }

    #[tokio::test]
    async fn test_successful_search_recorded_in_history() {
        let f = fixture(MockMovieApi::new(), true).await;
        f.session.search("Matrix").await.unwrap();
        f.session.search("Batman").await.unwrap();

        let history = SearchHistory::new(f.history_store.clone());
        assert_eq!(history.list(), vec!["Batman", "Matrix"]);
    }

    #[tokio::test]
    async fn test_zero_results_is_not_found() {
        let f = fixture(MockMovieApi::new(), true).await;
        assert_eq!(
            f.session.search("zzzz unknown").await.unwrap_err(),
            SearchError::NotFound
        );
        assert!(f.session.history.list().is_empty());
    }

    #[tokio::test]
    async fn test_server_error_translated() {
        let f = fixture(
            MockMovieApi::new()
                .with_error(ApiError::ServerError("502 Bad Gateway".to_string()))
                .await,
            true,
        )
        .await;

        let err = f.session.search("matrix").await.unwrap_err();
        assert_eq!(err, SearchError::ServerError("502 Bad Gateway".to_string()));
        assert!(!f.session.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_distinct_from_cancel() {
        let f = fixture(
            MockMovieApi::new()
                .with_delay(Duration::from_secs(20))
                .await,
            false,
        )
        .await;

        let err = f.session.search("matrix").await.unwrap_err();
        assert_eq!(err, SearchError::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_search_cancels_older() {
        let f = fixture(
            MockMovieApi::new()
                .with_delay(Duration::from_secs(1))
                .await,
            false,
        )
        .await;

        let (older, newer) = tokio::join!(f.session.search("matrix"), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            f.session.search("batman").await
        });

        assert_eq!(older.unwrap_err(), SearchError::UserCancelled);
        let newer = newer.unwrap();
        assert_eq!(newer.page.results[0].title, "Batman");
        assert_eq!(f.session.current_term().as_deref(), Some("batman"));
        assert!(!f.session.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_supersedes_pending_search() {
        let f = fixture(
            MockMovieApi::new()
                .with_delay(Duration::from_secs(1))
                .await,
            true,
        )
        .await;
        f.session.search("batman").await.unwrap();
        f.api
            .set_error(Some(ApiError::ServerError("502".to_string())))
            .await;

        let (older, newer) = tokio::join!(f.session.search("matrix"), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            f.session.search("batman").await
        });

        assert_eq!(older.unwrap_err(), SearchError::UserCancelled);
        assert!(newer.unwrap().from_cache);
        assert_eq!(f.session.current_term().as_deref(), Some("batman"));
        assert!(!f.session.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_failure_is_cancelled_not_reported() {
        let f = fixture(
            MockMovieApi::new()
                .with_delay(Duration::from_secs(1))
                .await
                .with_error(ApiError::ServerError("502".to_string()))
                .await,
            false,
        )
        .await;

        let (older, newer) = tokio::join!(f.session.search("matrix"), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            f.session.search("batman").await
        });

        assert_eq!(older.unwrap_err(), SearchError::UserCancelled);
        assert_eq!(
            newer.unwrap_err(),
            SearchError::ServerError("502".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_runs_only_last_input() {
        let f = fixture(MockMovieApi::new(), false).await;

        let (first, last) = tokio::join!(f.session.type_text("bat"), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            f.session.type_text("batman").await
        });

        assert!(first.is_none());
        let last = last.unwrap().unwrap();
        assert_eq!(last.term, "batman");
        assert_eq!(f.api.queries().await, vec!["batman".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_ignores_short_text() {
        let f = fixture(MockMovieApi::new(), false).await;
        assert!(f.session.type_text("bat").await.is_none());
        assert_eq!(f.api.call_counts().await.search, 0);
    }

    #[tokio::test]
    async fn test_suggest_memoizes() {
        let f = fixture(MockMovieApi::new(), false).await;

        let first = f.session.suggest("Matrix").await;
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].title, "The Matrix");
        assert_eq!(first[0].id, Some(603));

        let again = f.session.suggest("mátrix").await;
        assert_eq!(again, first);
        assert_eq!(f.api.call_counts().await.search, 1);
    }

    #[tokio::test]
    async fn test_suggest_limits_to_six() {
        let many: Vec<Movie> = (1..=10)
            .map(|i| MockMovieApi::catalog(i, &format!("Star {i}"), "2000-01-01"))
            .collect();
        let f = fixture(MockMovieApi::new().with_search("star", many).await, false).await;

        assert_eq!(f.session.suggest("star").await.len(), MAX_SUGGESTIONS);
    }

    #[tokio::test]
    async fn test_suggest_short_term_skipped() {
        let f = fixture(MockMovieApi::new(), false).await;
        assert!(f.session.suggest(" é ").await.is_empty());
        assert_eq!(f.api.call_counts().await.search, 0);
    }

    #[tokio::test]
    async fn test_suggest_failure_is_empty() {
        let f = fixture(
            MockMovieApi::new()
                .with_error(ApiError::Network("offline".to_string()))
                .await,
            false,
        )
        .await;
        assert!(f.session.suggest("matrix").await.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_updates_changed_entry() {
        let f = fixture(MockMovieApi::new(), true).await;
        let cached = f.session.search("matrix").await.unwrap();

        let mut reloaded = matrix();
        reloaded.overview = "Nueva sinopsis".to_string();
        f.api.set_search("matrix", vec![reloaded]).await;

        assert!(f.session.refresh("matrix", &cached.page).await);

        let again = f.session.search("matrix").await.unwrap();
        assert!(again.from_cache);
        assert_eq!(again.page.results[0].overview, "Nueva sinopsis");
    }

    #[tokio::test]
    async fn test_refresh_unchanged_or_failed_is_quiet() {
        let f = fixture(MockMovieApi::new(), true).await;
        let cached = f.session.search("matrix").await.unwrap();

        assert!(!f.session.refresh("matrix", &cached.page).await);

        f.api
            .set_error(Some(ApiError::ServerError("500".to_string())))
            .await;
        assert!(!f.session.refresh("matrix", &cached.page).await);
    }

    #[tokio::test]
    async fn test_refresh_skipped_when_term_changed() {
        let f = fixture(MockMovieApi::new(), true).await;
        let cached = f.session.search("matrix").await.unwrap();
        f.session.search("batman").await.unwrap();

        let mut reloaded = matrix();
        reloaded.overview = "Nueva sinopsis".to_string();
        f.api.set_search("matrix", vec![reloaded]).await;

        assert!(!f.session.refresh("matrix", &cached.page).await);

        let stored = f.session.client.cached_search("matrix").unwrap();
        assert_eq!(stored, cached.page);
        assert_ne!(stored.results[0].overview, "Nueva sinopsis");
    }

    #[tokio::test]
    async fn test_refresh_unchanged_leaves_cache_alone() {
        let f = fixture(MockMovieApi::new(), true).await;
        let cached = f.session.search("matrix").await.unwrap();

        f.api.set_search("matrix", vec![]).await;

        assert!(!f.session.refresh("matrix", &cached.page).await);
        assert_eq!(f.session.client.cached_search("matrix").unwrap(), cached.page);
    }

    #[tokio::test(start_paused = true)]
    async fn test_suggest_does_not_abort_refresh() {
        let f = fixture(
            MockMovieApi::new()
                .with_delay(Duration::from_secs(1))
                .await,
            true,
        )
        .await;
        let cached = f.session.search("matrix").await.unwrap();

        let mut reloaded = matrix();
        reloaded.overview = "Nueva sinopsis".to_string();
        f.api.set_search("matrix", vec![reloaded]).await;

        let (refreshed, suggestions) = tokio::join!(
            f.session.refresh("matrix", &cached.page),
            async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                f.session.suggest("batman").await
            }
        );

        assert!(refreshed);
        assert_eq!(suggestions.len(), 1);
    }
}
