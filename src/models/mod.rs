//! Display models for CLI output
//!
//! Converts domain types into CLI-friendly display rows for the table, JSON
//! and pretty formats.

pub mod display;

pub use display::{
    GenreDisplay, HistoryDisplay, MovieDisplay, SuggestionDisplay, WatchedDisplay,
};
