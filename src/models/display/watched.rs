//! Watched item display model

use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use super::common::{format_rating, format_relative_time, truncate_string};
use crate::output::PrettyRow;
use crate::watched::WatchedItem;

#[derive(Debug, Clone, Tabled, Serialize)]
pub struct WatchedDisplay {
    #[tabled(rename = "ID")]
    pub id: String,

    #[tabled(rename = "TITLE")]
    pub title: String,

    #[tabled(rename = "YEAR")]
    pub year: String,

    #[tabled(rename = "RATING")]
    pub rating: String,

    #[tabled(rename = "SEEN")]
    pub seen: String,

    #[tabled(rename = "NOTE")]
    pub note: String,

    #[tabled(skip)]
    #[serde(skip)]
    preview: Option<String>,
}

impl From<&WatchedItem> for WatchedDisplay {
    fn from(item: &WatchedItem) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            year: item.year.clone(),
            rating: format_rating(item.rating),
            seen: format_relative_time(item.viewed_at),
            note: truncate_string(&item.note, 40),
            preview: item.synopsis_preview(),
        }
    }
}

impl PrettyRow for WatchedDisplay {
    fn pretty(&self) -> String {
        let mut out = format!("{} ({})", self.title.bold(), self.year);
        if self.rating != "--" {
            out.push_str(&format!("  {} {}/10", "★".yellow(), self.rating));
        }
        out.push_str(&format!("\n  {}  seen {}", self.id.dimmed(), self.seen));
        if !self.note.is_empty() {
            out.push_str(&format!("\n  {} {}", "note:".cyan(), self.note));
        }
        if let Some(preview) = &self.preview {
            out.push_str(&format!("\n  {}", truncate_string(preview, 140)));
        }
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_watched_display_from_item() {
        let item = WatchedItem {
            id: "tt0113277".to_string(),
            title: "Heat".to_string(),
            year: "1995".to_string(),
            poster: String::new(),
            viewed_at: 0,
            rating: Some(9.0),
            note: "Rewatch the bank scene".to_string(),
            source_data: json!({"Plot": "A group of professional bank robbers."}),
        };

        let display = WatchedDisplay::from(&item);
        assert_eq!(display.rating, "9.0");
        assert_eq!(display.seen, "--");
        assert_eq!(
            display.preview.as_deref(),
            Some("A group of professional bank robbers.")
        );

        let value = serde_json::to_value(&display).unwrap();
        assert!(value.get("preview").is_none());
    }
}
