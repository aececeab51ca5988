//! Caching wrapper for the movie API client
//!
//! Search pages go through the session query cache (page 1 only) and every
//! endpoint goes through in-flight de-duplication. Genres are memoized for
//! the life of the process.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use super::inflight::InFlight;
use super::key::normalize_key;
use super::query::QueryCache;
use crate::client::{ApiResult, Genre, Movie, MovieApi, SearchPage};

/// Cached wrapper for any [`MovieApi`] implementation.
///
/// The query cache is optional (`--no-cache` disables it); de-duplication is
/// always on.
pub struct CachedMovieClient<C: MovieApi> {
    inner: Arc<C>,
    cache: Option<QueryCache>,
    pages: InFlight<SearchPage>,
    movies: InFlight<Movie>,
    lookups: InFlight<Option<Movie>>,
    genre_list: InFlight<Vec<Genre>>,
    genre_memo: Mutex<Option<Vec<Genre>>>,
}

impl<C: MovieApi + 'static> CachedMovieClient<C> {
    pub fn new(inner: C, cache: Option<QueryCache>) -> Self {
        Self::from_arc(Arc::new(inner), cache)
    }

    pub fn from_arc(inner: Arc<C>, cache: Option<QueryCache>) -> Self {
        Self {
            inner,
            cache,
            pages: InFlight::new(),
            movies: InFlight::new(),
            lookups: InFlight::new(),
            genre_list: InFlight::new(),
            genre_memo: Mutex::new(None),
        }
    }

    /// Cached first page for a normalized key
    pub fn cached_search(&self, key: &str) -> Option<SearchPage> {
        self.cache.as_ref()?.get(key)
    }

    /// Overwrite the cached first page for a normalized key
    pub fn store_search(&self, key: &str, page: &SearchPage) {
        if let Some(cache) = &self.cache {
            cache.put(key, page);
        }
    }

    /// Fetch a search page from the API, bypassing cache reads.
    ///
    /// Identical concurrent searches share one request. A non-empty first
    /// page is written to the cache.
    pub async fn fetch_search(&self, query: &str, page: u32) -> ApiResult<SearchPage> {
        let result = self.fetch_search_uncached(query, page).await?;
        if page == 1
            && !result.results.is_empty()
            && let Some(key) = normalize_key(query)
        {
            self.store_search(&key, &result);
        }
        Ok(result)
    }

    /// Fetch a search page without reading or writing the cache
    pub async fn fetch_search_uncached(&self, query: &str, page: u32) -> ApiResult<SearchPage> {
        let query = query.trim().to_string();
        let Some(key) = normalize_key(&query) else {
            return Ok(SearchPage::empty());
        };

        let inner = Arc::clone(&self.inner);
        self.pages
            .dedupe(&format!("search|{}|{}", key, page), move || async move {
                inner.search(&query, page).await
            })
            .await
    }

    async fn listing<F, Fut>(&self, key: String, fetch: F) -> ApiResult<SearchPage>
    where
        F: FnOnce(Arc<C>) -> Fut,
        Fut: std::future::Future<Output = ApiResult<SearchPage>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        self.pages.dedupe(&key, move || fetch(inner)).await
    }
}

#[async_trait]
impl<C: MovieApi + 'static> MovieApi for CachedMovieClient<C> {
    async fn search(&self, query: &str, page: u32) -> ApiResult<SearchPage> {
        if page == 1
            && let Some(key) = normalize_key(query)
            && let Some(cached) = self.cached_search(&key)
        {
            return Ok(cached);
        }
        self.fetch_search(query, page).await
    }

    async fn movie(&self, tmdb_id: i64) -> ApiResult<Movie> {
        let inner = Arc::clone(&self.inner);
        self.movies
            .dedupe(&format!("movie|{}", tmdb_id), move || async move {
                inner.movie(tmdb_id).await
            })
            .await
    }

    async fn popular(&self, page: u32) -> ApiResult<SearchPage> {
        self.listing(format!("popular|{}", page), move |inner| async move {
            inner.popular(page).await
        })
        .await
    }

    async fn top_rated(&self, page: u32) -> ApiResult<SearchPage> {
        self.listing(format!("top_rated|{}", page), move |inner| async move {
            inner.top_rated(page).await
        })
        .await
    }

    async fn discover_by_genre(&self, genre_id: i64, page: u32) -> ApiResult<SearchPage> {
        self.listing(
            format!("discover_genre|{}|{}", genre_id, page),
            move |inner| async move { inner.discover_by_genre(genre_id, page).await },
        )
        .await
    }

    async fn genres(&self) -> ApiResult<Vec<Genre>> {
        let memo = self
            .genre_memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(genres) = memo {
            log::debug!("Genre list served from memory");
            return Ok(genres);
        }

        let inner = Arc::clone(&self.inner);
        let genres = self
            .genre_list
            .dedupe("genres", move || async move { inner.genres().await })
            .await?;

        *self
            .genre_memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(genres.clone());
        Ok(genres)
    }

    async fn find_by_external_id(&self, external_id: &str) -> ApiResult<Option<Movie>> {
        let inner = Arc::clone(&self.inner);
        let external_id = external_id.trim().to_string();
        self.lookups
            .dedupe(&format!("find|{}", external_id), move || async move {
                inner.find_by_external_id(&external_id).await
            })
            .await
    }
}
