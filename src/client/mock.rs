//! Mock movie API for testing
//!
//! Provides a scripted implementation of [`MovieApi`] for unit tests of the
//! cache, session and watched-list layers without making real API calls.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;

use super::models::{Genre, ImageConfig, Movie, SearchPage};
use super::{ApiResult, MovieApi};
use crate::cache::fold_title;
use crate::error::ApiError;

/// Mock API client for testing.
///
/// Configure responses via builder methods, then use in tests.
///
/// # Example
/// ```ignore
/// let mock = MockMovieApi::new()
///     .with_search("matrix", vec![MockMovieApi::catalog(603, "The Matrix", "1999-03-30")])
///     .await;
///
/// let page = mock.search("Matrix", 1).await?;
/// assert_eq!(page.results.len(), 1);
/// ```
#[derive(Default)]
pub struct MockMovieApi {
    /// Search results keyed by folded query
    searches: Arc<Mutex<HashMap<String, Vec<Movie>>>>,
    /// Movies returned by `movie` and `find_by_external_id`
    movies: Arc<Mutex<Vec<Movie>>>,
    /// Listing returned by `popular`, `top_rated` and `discover_by_genre`
    listing: Arc<Mutex<Vec<Movie>>>,
    genres: Arc<Mutex<Vec<Genre>>>,
    /// Error to return (if any); persists until cleared
    error: Arc<Mutex<Option<ApiError>>>,
    /// Artificial latency applied to every call
    delay: Arc<Mutex<Option<Duration>>>,
    call_count: Arc<Mutex<CallCounts>>,
    /// Queries passed to `search`, in call order
    queries: Arc<Mutex<Vec<String>>>,
}

/// Tracks API call counts for test verification
#[derive(Default, Debug, Clone)]
pub struct CallCounts {
    pub search: usize,
    pub movie: usize,
    pub popular: usize,
    pub top_rated: usize,
    pub discover_by_genre: usize,
    pub genres: usize,
    pub find_by_external_id: usize,
}

impl MockMovieApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog movie the way the real client would
    pub fn catalog(id: i64, title: &str, release_date: &str) -> Movie {
        let raw = json!({"id": id, "title": title, "release_date": release_date});
        Movie::from_value(raw, &ImageConfig::default()).expect("valid catalog record")
    }

    pub async fn with_search(self, query: &str, results: Vec<Movie>) -> Self {
        self.searches.lock().await.insert(fold_title(query), results);
        self
    }

    pub async fn with_movie(self, movie: Movie) -> Self {
        self.movies.lock().await.push(movie);
        self
    }

    pub async fn with_listing(self, movies: Vec<Movie>) -> Self {
        *self.listing.lock().await = movies;
        self
    }

    pub async fn with_genres(self, genres: Vec<Genre>) -> Self {
        *self.genres.lock().await = genres;
        self
    }

    pub async fn with_error(self, error: ApiError) -> Self {
        *self.error.lock().await = Some(error);
        self
    }

    pub async fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().await = Some(delay);
        self
    }

    pub async fn set_error(&self, error: Option<ApiError>) {
        *self.error.lock().await = error;
    }

    pub async fn set_search(&self, query: &str, results: Vec<Movie>) {
        self.searches.lock().await.insert(fold_title(query), results);
    }

    pub async fn call_counts(&self) -> CallCounts {
        self.call_count.lock().await.clone()
    }

    pub async fn queries(&self) -> Vec<String> {
        self.queries.lock().await.clone()
    }

    /// Apply latency, then the scripted error if any
    async fn respond(&self) -> ApiResult<()> {
        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.error.lock().await.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn page_of(results: Vec<Movie>, page: u32) -> SearchPage {
        let total = results.len() as u32;
        SearchPage {
            page,
            results,
            total_pages: if total == 0 { 0 } else { 1 },
            total_results: total,
        }
    }
}

#[async_trait]
impl MovieApi for MockMovieApi {
    async fn search(&self, query: &str, page: u32) -> ApiResult<SearchPage> {
        self.call_count.lock().await.search += 1;
        self.queries.lock().await.push(query.to_string());
        self.respond().await?;

        let results = self
            .searches
            .lock()
            .await
            .get(&fold_title(query))
            .cloned()
            .unwrap_or_default();
        Ok(Self::page_of(results, page))
    }

    async fn movie(&self, tmdb_id: i64) -> ApiResult<Movie> {
        self.call_count.lock().await.movie += 1;
        self.respond().await?;

        self.movies
            .lock()
            .await
            .iter()
            .find(|m| m.tmdb_id == Some(tmdb_id))
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("movie {}", tmdb_id)))
    }

    async fn popular(&self, page: u32) -> ApiResult<SearchPage> {
        self.call_count.lock().await.popular += 1;
        self.respond().await?;
        Ok(Self::page_of(self.listing.lock().await.clone(), page))
    }

    async fn top_rated(&self, page: u32) -> ApiResult<SearchPage> {
        self.call_count.lock().await.top_rated += 1;
        self.respond().await?;
        Ok(Self::page_of(self.listing.lock().await.clone(), page))
    }

    async fn discover_by_genre(&self, _genre_id: i64, page: u32) -> ApiResult<SearchPage> {
        self.call_count.lock().await.discover_by_genre += 1;
        self.respond().await?;
        Ok(Self::page_of(self.listing.lock().await.clone(), page))
    }

    async fn genres(&self) -> ApiResult<Vec<Genre>> {
        self.call_count.lock().await.genres += 1;
        self.respond().await?;
        Ok(self.genres.lock().await.clone())
    }

    async fn find_by_external_id(&self, external_id: &str) -> ApiResult<Option<Movie>> {
        self.call_count.lock().await.find_by_external_id += 1;
        self.respond().await?;

        Ok(self
            .movies
            .lock()
            .await
            .iter()
            .find(|m| m.imdb_id.as_deref() == Some(external_id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_search_is_case_and_accent_insensitive() {
        let mock = MockMovieApi::new()
            .with_search("amelie", vec![MockMovieApi::catalog(194, "Amélie", "2001-04-25")])
            .await;

        let page = mock.search("Amélie", 1).await.unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(mock.call_counts().await.search, 1);
        assert_eq!(mock.queries().await, vec!["Amélie".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_error_persists() {
        let mock = MockMovieApi::new()
            .with_error(ApiError::ServerError("boom".to_string()))
            .await;

        assert!(mock.genres().await.is_err());
        assert!(mock.popular(1).await.is_err());

        mock.set_error(None).await;
        assert!(mock.genres().await.is_ok());
    }
}
