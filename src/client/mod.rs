//! Movie metadata API client

use async_trait::async_trait;

use crate::error::ApiError;

#[cfg(test)]
pub mod mock;
pub mod models;
pub mod tmdb;

#[cfg(test)]
pub use mock::MockMovieApi;
pub use models::{Genre, ImageConfig, Movie, SearchPage};
pub use tmdb::{ClientSettings, TmdbClient};

/// Result of a metadata API call.
///
/// The error type is [`ApiError`] rather than the crate-wide error so that
/// outcomes can be shared between de-duplicated callers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Movie metadata API
#[async_trait]
pub trait MovieApi: Send + Sync {
    /// Search movies by title. A blank query yields an empty page.
    async fn search(&self, query: &str, page: u32) -> ApiResult<SearchPage>;

    /// Fetch one movie by catalog id
    async fn movie(&self, tmdb_id: i64) -> ApiResult<Movie>;

    /// Popular movies
    async fn popular(&self, page: u32) -> ApiResult<SearchPage>;

    /// Top rated movies
    async fn top_rated(&self, page: u32) -> ApiResult<SearchPage>;

    /// Movies in a genre, most popular first
    async fn discover_by_genre(&self, genre_id: i64, page: u32) -> ApiResult<SearchPage>;

    /// All movie genres
    async fn genres(&self) -> ApiResult<Vec<Genre>>;

    /// Resolve a legacy IMDb id to a catalog record; `None` when unknown
    async fn find_by_external_id(&self, external_id: &str) -> ApiResult<Option<Movie>>;
}
