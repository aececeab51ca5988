//! CLI command definitions and handlers

use clap::{Parser, Subcommand};
pub use clap_complete::Shell;

pub mod args;
pub mod browse;
pub mod cache;
pub mod completions;
pub mod context;
pub mod history;
pub mod init;
pub mod search;
pub mod status;
pub mod watched;

pub use args::{OutputFormat, PageArgs};
pub use context::CommandContext;

/// cinetrack - search movies and keep a list of what you have watched
#[derive(Parser, Debug)]
#[command(name = "cinetrack")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "CINETRACK_FORMAT",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: Option<OutputFormat>,

    /// Override config file location
    #[arg(long, global = true, env = "CINETRACK_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// TMDB API key (overrides the config file)
    #[arg(
        long,
        global = true,
        env = "CINETRACK_API_KEY",
        hide_env = true,
        hide_env_values = true
    )]
    pub api_key: Option<String>,

    /// Metadata API base URL
    #[arg(long, global = true, env = "CINETRACK_API_BASE", hide_env = true)]
    pub api_base: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "CINETRACK_DEBUG", hide_env = true)]
    pub debug: bool,

    /// Skip the session search cache
    #[arg(long, global = true, env = "CINETRACK_NO_CACHE", hide_env = true)]
    pub no_cache: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Set up the TMDB API key
    Init,

    /// Show configuration and storage status
    Status,

    /// Search movies by title
    #[command(after_help = "EXAMPLES:\n  \
            cinetrack search \"the matrix\"\n  \
            cinetrack search heat --page 2\n  \
            cinetrack search                 # Run the search picked with `history select`")]
    Search {
        /// Title to search for
        query: Option<String>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Suggest titles for a partial search term
    Suggest {
        /// Partial title
        term: String,
    },

    /// Show one movie by id (603, tmdb:603 or tt0133093)
    Show {
        /// Movie id
        id: String,
    },

    /// Browse movie listings
    #[command(subcommand)]
    Browse(BrowseCommands),

    /// Manage your watched list
    #[command(subcommand)]
    Watched(WatchedCommands),

    /// View and reuse past searches
    #[command(subcommand)]
    History(HistoryCommands),

    /// Manage the session search cache
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Generate shell completions
    #[command(after_help = "\
  bash:   cinetrack completion bash > /etc/bash_completion.d/cinetrack
  zsh:    cinetrack completion zsh > \"${fpath[1]}/_cinetrack\"
  fish:   cinetrack completion fish > ~/.config/fish/completions/cinetrack.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Listing subcommands
#[derive(Subcommand, Debug)]
pub enum BrowseCommands {
    /// Popular movies
    Popular {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Top rated movies
    TopRated {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Movies in a genre
    Genre {
        /// Genre ID (see `browse genres`); defaults to the last one browsed
        id: Option<i64>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// List movie genres
    Genres,
}

/// Watched list subcommands
#[derive(Subcommand, Debug)]
pub enum WatchedCommands {
    /// List watched movies, most recent first
    List,

    /// Show one watched movie with its synopsis
    Show {
        /// Watched item id
        id: String,
    },

    /// Mark a movie as watched
    Mark {
        /// Movie id (603, tmdb:603 or tt0133093)
        id: String,
    },

    /// Rate a watched movie from 0 to 10
    Rate {
        /// Watched item id
        id: String,

        /// Rating between 0 and 10
        rating: f64,
    },

    /// Attach a note to a watched movie
    Note {
        /// Watched item id
        id: String,

        /// Note text (empty to clear)
        text: String,
    },

    /// Remove a movie from the watched list
    #[command(after_help = "EXAMPLES:\n  \
            cinetrack watched remove tmdb:603        # With confirmation\n  \
            cinetrack watched remove tmdb:603 --yes  # Skip confirmation\n  \
            cinetrack watched undo                   # Restore it shortly after")]
    Remove {
        /// Watched item id
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Restore the most recently removed movie
    Undo,

    /// Check whether a movie is on the watched list
    Check {
        /// Movie id (603, tmdb:603 or tt0133093)
        id: String,
    },

    /// Fetch the synopsis and details of a watched movie
    Enrich {
        /// Watched item id
        id: String,
    },
}

/// Search history subcommands
#[derive(Subcommand, Debug)]
pub enum HistoryCommands {
    /// List recent searches
    List,

    /// Forget all recent searches
    Clear,

    /// Pick a past search to run with the next `cinetrack search`
    Select {
        /// Position in `history list` (1-based)
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        position: u32,
    },
}

/// Cache management subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show cache statistics
    Status,

    /// Clear all cached searches
    Clear,

    /// Print the cache location
    Path,
}
