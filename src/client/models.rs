//! Movie metadata models
//!
//! Two record shapes reach the application: the legacy OMDb-style shape
//! (`imdbID`, `Title`, `Year`, ...) found in older stored data, and the
//! catalog shape returned by TMDB. Both are parsed into [`MovieRecord`] and
//! normalized once into [`Movie`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Poster path used when a record has no usable image
pub const PLACEHOLDER_POSTER: &str = "./assets/placeholder.png";

/// Default image CDN base
pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/";

/// Default poster size segment
pub const DEFAULT_POSTER_SIZE: &str = "w342";

/// Where poster images are served from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageConfig {
    pub base: String,
    pub poster_size: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            base: DEFAULT_IMAGE_BASE.to_string(),
            poster_size: DEFAULT_POSTER_SIZE.to_string(),
        }
    }
}

impl ImageConfig {
    /// Full poster URL for a catalog `poster_path`
    pub fn poster_url(&self, poster_path: &str) -> String {
        format!("{}{}{}", self.base, self.poster_size, poster_path)
    }
}

/// Legacy OMDb-style record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OmdbMovie {
    #[serde(rename = "imdbID")]
    pub imdb_id: String,

    #[serde(rename = "Title")]
    pub title: String,

    #[serde(rename = "Year", default)]
    pub year: Option<String>,

    #[serde(rename = "Poster", default)]
    pub poster: Option<String>,

    #[serde(rename = "Plot", default)]
    pub plot: Option<String>,

    #[serde(rename = "imdbRating", default)]
    pub imdb_rating: Option<String>,
}

/// Catalog (TMDB) record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogMovie {
    pub id: i64,

    #[serde(default)]
    pub title: Option<String>,

    /// TV results carry `name` instead of `title`
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub release_date: Option<String>,

    #[serde(default)]
    pub first_air_date: Option<String>,

    #[serde(default)]
    pub poster_path: Option<String>,

    #[serde(default)]
    pub overview: Option<String>,

    #[serde(default)]
    pub vote_average: Option<f64>,

    #[serde(default)]
    pub imdb_id: Option<String>,
}

/// A raw movie record in either known shape
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MovieRecord {
    Catalog(CatalogMovie),
    Omdb(OmdbMovie),
}

/// Canonical movie used throughout the application
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    /// `tmdb:<n>` for catalog records, the IMDb id for legacy ones
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,

    pub title: String,

    #[serde(default)]
    pub year: String,

    #[serde(default)]
    pub poster: String,

    #[serde(default)]
    pub overview: String,

    #[serde(default)]
    pub vote_average: Option<f64>,

    #[serde(default)]
    pub release_date: Option<String>,

    /// The record as received
    #[serde(default)]
    pub raw: Value,
}

impl Movie {
    /// Parse and normalize a raw JSON record
    pub fn from_value(raw: Value, images: &ImageConfig) -> Result<Self, serde_json::Error> {
        let record: MovieRecord = serde_json::from_value(raw.clone())?;
        Ok(Self::normalize(record, raw, images))
    }

    fn normalize(record: MovieRecord, raw: Value, images: &ImageConfig) -> Self {
        match record {
            MovieRecord::Catalog(m) => {
                let release_date = non_empty(m.release_date).or(non_empty(m.first_air_date));
                Self {
                    id: format!("tmdb:{}", m.id),
                    tmdb_id: Some(m.id),
                    imdb_id: non_empty(m.imdb_id),
                    title: m.title.or(m.name).unwrap_or_default(),
                    year: release_date.as_deref().map(year_of).unwrap_or_default(),
                    poster: non_empty(m.poster_path)
                        .map(|path| images.poster_url(&path))
                        .unwrap_or_default(),
                    overview: m.overview.unwrap_or_default(),
                    vote_average: m.vote_average,
                    release_date,
                    raw,
                }
            }
            MovieRecord::Omdb(m) => Self {
                id: m.imdb_id.clone(),
                tmdb_id: None,
                imdb_id: Some(m.imdb_id),
                title: m.title,
                year: m.year.unwrap_or_default(),
                poster: m.poster.filter(|p| p != "N/A").unwrap_or_default(),
                overview: m.plot.filter(|p| p != "N/A").unwrap_or_default(),
                vote_average: m.imdb_rating.and_then(|r| r.parse().ok()),
                release_date: None,
                raw,
            },
        }
    }

    /// Poster URL, or the placeholder when there is none
    pub fn poster_or_placeholder(&self) -> &str {
        if self.poster.trim().is_empty() || self.poster == "N/A" {
            PLACEHOLDER_POSTER
        } else {
            &self.poster
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// First four characters of a date string
fn year_of(date: &str) -> String {
    date.chars().take(4).collect()
}

/// One page of search or listing results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchPage {
    pub page: u32,
    pub results: Vec<Movie>,
    pub total_pages: u32,
    pub total_results: u32,
}

impl SearchPage {
    pub fn empty() -> Self {
        Self {
            page: 1,
            results: Vec::new(),
            total_pages: 0,
            total_results: 0,
        }
    }
}

/// Movie genre
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}
