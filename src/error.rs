//! Error types for cinetrack

use std::time::Duration;
use thiserror::Error;

/// Result type alias for cinetrack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Interactive prompt error: {0}")]
    Prompt(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation failed: {0}")]
    Other(String),
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        Error::Prompt(err.to_string())
    }
}

impl Error {
    /// True when the failure was a superseded request that must not be shown.
    pub fn is_user_cancelled(&self) -> bool {
        matches!(
            self,
            Error::Search(SearchError::UserCancelled) | Error::Api(ApiError::Cancelled)
        )
    }
}

/// Metadata API errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("The API rejected the key. Run `cinetrack init` to set a valid TMDB API key.")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded. Retry after {0:?}")]
    RateLimit(Duration),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Network("Failed to connect to API".to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Failure kinds surfaced by a user-initiated search.
///
/// Every network or parsing failure is translated into one of these before it
/// reaches the command layer. `UserCancelled` is swallowed by the caller and
/// `StorageFailure` is only ever logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Please enter a movie title. Type a title before searching.")]
    InputEmpty,

    #[error("Movie not found. No results matched that title; check the spelling or try another name.")]
    NotFound,

    #[error("Server error. There was a problem talking to the server ({0}); try again in a few seconds.")]
    ServerError(String),

    #[error("Request timed out. The search took too long; check your connection and try again.")]
    Timeout,

    #[error("Search cancelled")]
    UserCancelled,

    #[error("Local storage failure: {0}")]
    StorageFailure(String),

    #[error("Unknown error. Something went wrong that we could not identify ({0}); try again.")]
    Unknown(String),
}

impl From<ApiError> for SearchError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound(_) => SearchError::NotFound,
            ApiError::Timeout(_) => SearchError::Timeout,
            ApiError::Cancelled => SearchError::UserCancelled,
            ApiError::ServerError(msg) => SearchError::ServerError(msg),
            ApiError::RateLimit(after) => {
                SearchError::ServerError(format!("rate limited, retry after {after:?}"))
            }
            ApiError::Unauthorized => SearchError::ServerError("API key rejected".to_string()),
            ApiError::Network(msg) | ApiError::InvalidResponse(msg) => SearchError::Unknown(msg),
        }
    }
}

impl From<StorageError> for SearchError {
    fn from(err: StorageError) -> Self {
        SearchError::StorageFailure(err.to_string())
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found. Run `cinetrack init` to set up.")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),

    #[error("TMDB API key not configured. Run `cinetrack init` or set CINETRACK_API_KEY.")]
    MissingApiKey,
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Key-value storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage quota exceeded")]
    QuotaExceeded,

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
