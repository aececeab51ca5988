//! Movie, genre and suggestion display models

use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use super::common::{format_rating, truncate_string};
use crate::client::{Genre, Movie};
use crate::output::PrettyRow;
use crate::session::Suggestion;

/// Movie display model for search results and listings
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct MovieDisplay {
    #[tabled(rename = "ID")]
    pub id: String,

    #[tabled(rename = "TITLE")]
    pub title: String,

    #[tabled(rename = "YEAR")]
    pub year: String,

    #[tabled(rename = "RATING")]
    pub rating: String,

    #[tabled(rename = "WATCHED")]
    #[serde(serialize_with = "serialize_watched")]
    pub watched: String,

    #[tabled(skip)]
    pub poster: String,

    #[tabled(skip)]
    pub overview: String,
}

fn serialize_watched<S: serde::Serializer>(value: &str, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_bool(!value.is_empty())
}

impl MovieDisplay {
    pub fn new(movie: &Movie, watched: bool) -> Self {
        Self {
            id: movie.id.clone(),
            title: movie.title.clone(),
            year: if movie.year.is_empty() {
                "--".to_string()
            } else {
                movie.year.clone()
            },
            rating: format_rating(movie.vote_average),
            watched: if watched { "✓".to_string() } else { String::new() },
            poster: movie.poster_or_placeholder().to_string(),
            overview: movie.overview.clone(),
        }
    }
}

impl PrettyRow for MovieDisplay {
    fn pretty(&self) -> String {
        let mut out = format!("{} ({})", self.title.bold(), self.year);
        if self.rating != "--" {
            out.push_str(&format!("  {} {}", "★".yellow(), self.rating));
        }
        if !self.watched.is_empty() {
            out.push_str(&format!("  {}", "✓ watched".green()));
        }
        out.push_str(&format!("\n  {}", self.id.dimmed()));
        if !self.overview.trim().is_empty() {
            out.push_str(&format!("\n  {}", truncate_string(self.overview.trim(), 140)));
        }
        out.push('\n');
        out
    }
}

/// Genre display model
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct GenreDisplay {
    #[tabled(rename = "GENRE ID")]
    pub id: i64,

    #[tabled(rename = "NAME")]
    pub name: String,
}

impl From<&Genre> for GenreDisplay {
    fn from(genre: &Genre) -> Self {
        Self {
            id: genre.id,
            name: genre.name.clone(),
        }
    }
}

impl PrettyRow for GenreDisplay {
    fn pretty(&self) -> String {
        format!("{:>6}  {}", self.id.to_string().dimmed(), self.name)
    }
}

/// Suggestion display model
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct SuggestionDisplay {
    #[tabled(rename = "TITLE")]
    pub title: String,

    #[tabled(rename = "YEAR")]
    pub year: String,

    #[tabled(rename = "ID")]
    #[serde(skip)]
    pub id_label: String,

    #[tabled(skip)]
    pub id: Option<i64>,
}

impl From<&Suggestion> for SuggestionDisplay {
    fn from(s: &Suggestion) -> Self {
        Self {
            title: s.title.clone(),
            year: s.year.clone(),
            id_label: s.id.map(|i| i.to_string()).unwrap_or_else(|| "--".to_string()),
            id: s.id,
        }
    }
}

impl PrettyRow for SuggestionDisplay {
    fn pretty(&self) -> String {
        let year = if self.year.is_empty() {
            String::new()
        } else {
            format!(" ({})", self.year)
        };
        format!("{}{}", self.title.bold(), year)
    }
}
