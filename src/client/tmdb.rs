//! TMDB API client implementation

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::models::{Genre, ImageConfig, Movie, SearchPage};
use super::{ApiResult, MovieApi};
use crate::error::ApiError;

/// TMDB API base URL
pub const API_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Default response language
pub const DEFAULT_LANGUAGE: &str = "es-ES";

/// Default client-side request rate
pub const DEFAULT_RATE_LIMIT_PER_SECOND: u32 = 40;

/// Connection settings for [`TmdbClient`]
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub language: String,
    pub images: ImageConfig,
    pub rate_limit_per_second: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: API_BASE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            images: ImageConfig::default(),
            rate_limit_per_second: DEFAULT_RATE_LIMIT_PER_SECOND,
        }
    }
}

/// Listing envelope shared by search, popular, top rated and discover
#[derive(Deserialize)]
struct PageResponse {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    total_pages: Option<u32>,
    #[serde(default)]
    total_results: Option<u32>,
}

/// TMDB API client
pub struct TmdbClient {
    http: HttpClient,
    api_key: String,
    settings: ClientSettings,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl TmdbClient {
    /// Create a new TMDB API client
    pub fn new(api_key: String, settings: ClientSettings) -> ApiResult<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let rate = NonZeroU32::new(settings.rate_limit_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(rate)));

        Ok(Self {
            http,
            api_key,
            settings: ClientSettings {
                base_url: settings.base_url.trim_end_matches('/').to_string(),
                ..settings
            },
            rate_limiter,
        })
    }

    /// Issue a GET request and return the parsed JSON body
    async fn request(&self, path: &str, params: &[(&str, String)]) -> ApiResult<Value> {
        if self.rate_limiter.check().is_err() {
            log::debug!("Waiting for rate limiter before {}", path);
            self.rate_limiter.until_ready().await;
        }

        let url = format!("{}{}", self.settings.base_url, path);
        log::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.settings.language.as_str()),
            ])
            .query(params)
            .send()
            .await
            .map_err(ApiError::from)?;

        let status = response.status();
        match status {
            status if status.is_success() => {
                let text = response.text().await.map_err(|e| {
                    ApiError::InvalidResponse(format!("Failed to read response: {}", e))
                })?;
                let body: Value = serde_json::from_str(&text).map_err(|e| {
                    ApiError::InvalidResponse(format!("Failed to parse response: {}", e))
                })?;
                if let Some(message) = failure_flag(&body) {
                    return Err(ApiError::NotFound(message));
                }
                Ok(body)
            }
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            StatusCode::NOT_FOUND => {
                let error_msg = response
                    .text()
                    .await
                    .ok()
                    .and_then(|text| serde_json::from_str::<Value>(&text).ok())
                    .and_then(|body| failure_flag(&body))
                    .unwrap_or_else(|| format!("{} not found", path));
                Err(ApiError::NotFound(error_msg))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(10);
                Err(ApiError::RateLimit(Duration::from_secs(retry_after)))
            }
            status => {
                let error_msg = response
                    .text()
                    .await
                    .ok()
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| format!("HTTP {}", status));
                Err(ApiError::ServerError(format!("{}: {}", status.as_u16(), error_msg)))
            }
        }
    }

    async fn fetch_page(&self, path: &str, params: &[(&str, String)]) -> ApiResult<SearchPage> {
        let body = self.request(path, params).await?;
        let response: PageResponse = serde_json::from_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Unexpected listing shape: {}", e)))?;

        Ok(SearchPage {
            page: response.page.unwrap_or(1),
            results: self.movies_from(response.results),
            total_pages: response.total_pages.unwrap_or(0),
            total_results: response.total_results.unwrap_or(0),
        })
    }

    fn movies_from(&self, records: Vec<Value>) -> Vec<Movie> {
        records
            .into_iter()
            .filter_map(|raw| match Movie::from_value(raw, &self.settings.images) {
                Ok(movie) => Some(movie),
                Err(e) => {
                    log::debug!("Skipping unrecognized movie record: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// Message of a body that signals failure (`"success": false` or an
/// OMDb-style `"Response": "False"`)
fn failure_flag(body: &Value) -> Option<String> {
    let failed = body.get("success").and_then(Value::as_bool) == Some(false)
        || body.get("Response").and_then(Value::as_str) == Some("False");
    if !failed {
        return None;
    }
    Some(
        body.get("status_message")
            .or_else(|| body.get("Error"))
            .and_then(Value::as_str)
            .unwrap_or("The resource you requested could not be found.")
            .to_string(),
    )
}

#[async_trait]
impl MovieApi for TmdbClient {
    async fn search(&self, query: &str, page: u32) -> ApiResult<SearchPage> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchPage::empty());
        }
        self.fetch_page(
            "/search/movie",
            &[("query", query.to_string()), ("page", page.to_string())],
        )
        .await
    }

    async fn movie(&self, tmdb_id: i64) -> ApiResult<Movie> {
        let body = self.request(&format!("/movie/{}", tmdb_id), &[]).await?;
        Movie::from_value(body, &self.settings.images)
            .map_err(|e| ApiError::InvalidResponse(format!("Unexpected movie shape: {}", e)))
    }

    async fn popular(&self, page: u32) -> ApiResult<SearchPage> {
        self.fetch_page("/movie/popular", &[("page", page.to_string())])
            .await
    }

    async fn top_rated(&self, page: u32) -> ApiResult<SearchPage> {
        self.fetch_page("/movie/top_rated", &[("page", page.to_string())])
            .await
    }

    async fn discover_by_genre(&self, genre_id: i64, page: u32) -> ApiResult<SearchPage> {
        self.fetch_page(
            "/discover/movie",
            &[
                ("with_genres", genre_id.to_string()),
                ("page", page.to_string()),
                ("sort_by", "popularity.desc".to_string()),
            ],
        )
        .await
    }

    async fn genres(&self) -> ApiResult<Vec<Genre>> {
        #[derive(Deserialize)]
        struct GenresResponse {
            #[serde(default)]
            genres: Vec<Genre>,
        }

        let body = self.request("/genre/movie/list", &[]).await?;
        let response: GenresResponse = serde_json::from_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Unexpected genre list: {}", e)))?;
        Ok(response.genres)
    }

    async fn find_by_external_id(&self, external_id: &str) -> ApiResult<Option<Movie>> {
        #[derive(Deserialize)]
        struct FindResponse {
            #[serde(default)]
            movie_results: Vec<Value>,
            #[serde(default)]
            tv_results: Vec<Value>,
        }

        let external_id = external_id.trim();
        if external_id.is_empty() {
            return Ok(None);
        }

        let path = format!("/find/{}", urlencoding::encode(external_id));
        let body = self
            .request(&path, &[("external_source", "imdb_id".to_string())])
            .await?;
        let response: FindResponse = serde_json::from_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Unexpected find response: {}", e)))?;

        let results = if response.movie_results.is_empty() {
            response.tv_results
        } else {
            response.movie_results
        };
        Ok(self.movies_from(results).into_iter().next())
    }
}
