//! Display model implementations for table and JSON output
//!
//! Display models transform domain types into CLI-friendly formats with
//! appropriate column names and serialization.

mod common;
mod history;
mod movie;
mod watched;

pub use common::format_rating;
pub use history::HistoryDisplay;
pub use movie::{GenreDisplay, MovieDisplay, SuggestionDisplay};
pub use watched::WatchedDisplay;
