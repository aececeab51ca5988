//! cinetrack - terminal movie search and watch-list companion for TMDB

use clap::Parser;

mod cache;
mod cli;
mod client;
mod clock;
mod config;
mod error;
mod history;
mod identity;
mod models;
mod output;
mod session;
mod store;
mod watched;

use cli::args::GlobalOptions;
use cli::{BrowseCommands, CacheCommands, Cli, Commands, HistoryCommands, WatchedCommands};
use error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        if err.is_user_cancelled() {
            log::debug!("Request superseded: {}", err);
            return;
        }
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
    log::debug!("Debug logging enabled");
}

async fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Init => cli::init::run(&opts).await,
        Commands::Status => cli::status::run(&opts),
        Commands::Search { query, page } => cli::search::search(&opts, query, page.page).await,
        Commands::Suggest { term } => cli::search::suggest(&opts, &term).await,
        Commands::Show { id } => cli::search::show(&opts, &id).await,
        Commands::Browse(browse_cmd) => match browse_cmd {
            BrowseCommands::Popular { page } => cli::browse::popular(&opts, page.page).await,
            BrowseCommands::TopRated { page } => cli::browse::top_rated(&opts, page.page).await,
            BrowseCommands::Genre { id, page } => cli::browse::genre(&opts, id, page.page).await,
            BrowseCommands::Genres => cli::browse::genres(&opts).await,
        },
        Commands::Watched(watched_cmd) => match watched_cmd {
            WatchedCommands::List => cli::watched::list(&opts),
            WatchedCommands::Show { id } => cli::watched::show(&opts, &id),
            WatchedCommands::Mark { id } => cli::watched::mark(&opts, &id).await,
            WatchedCommands::Rate { id, rating } => cli::watched::rate(&opts, &id, rating),
            WatchedCommands::Note { id, text } => cli::watched::note(&opts, &id, &text),
            WatchedCommands::Remove { id, yes } => cli::watched::remove(&opts, &id, yes),
            WatchedCommands::Undo => cli::watched::undo(&opts),
            WatchedCommands::Check { id } => cli::watched::check(&opts, &id),
            WatchedCommands::Enrich { id } => cli::watched::enrich(&opts, &id).await,
        },
        Commands::History(history_cmd) => match history_cmd {
            HistoryCommands::List => cli::history::list(&opts),
            HistoryCommands::Clear => cli::history::clear(&opts),
            HistoryCommands::Select { position } => cli::history::select(&opts, position),
        },
        Commands::Cache(cache_cmd) => match cache_cmd {
            CacheCommands::Status => cli::cache::status(&opts),
            CacheCommands::Clear => cli::cache::clear(&opts),
            CacheCommands::Path => cli::cache::path(),
        },
        Commands::Completion { shell } => {
            cli::completions::run(shell);
            Ok(())
        }
    }
}
