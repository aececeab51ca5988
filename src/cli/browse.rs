//! Browse command implementations

use crate::cli::CommandContext;
use crate::cli::args::GlobalOptions;
use crate::cli::search::print_page;
use crate::client::MovieApi;
use crate::error::{Error, Result};
use crate::models::GenreDisplay;
use crate::output::Formattable;

/// Session key of the last browsed genre
pub const LAST_GENRE_KEY: &str = "tmdb.lastGenre";

/// Run the browse popular command
pub async fn popular(opts: &GlobalOptions, page: u32) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let client = ctx.client()?;
    let results = ctx
        .fetch("Fetching popular movies...", client.popular(page))
        .await?;
    print_page(&ctx, None, &results, false)
}

/// Run the browse top-rated command
pub async fn top_rated(opts: &GlobalOptions, page: u32) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let client = ctx.client()?;
    let results = ctx
        .fetch("Fetching top rated movies...", client.top_rated(page))
        .await?;
    print_page(&ctx, None, &results, false)
}

/// Run the browse genre command
///
/// Without an id, the last browsed genre is used.
pub async fn genre(opts: &GlobalOptions, id: Option<i64>, page: u32) -> Result<()> {
    let ctx = CommandContext::new(opts)?;

    let genre_id = match id {
        Some(id) => id,
        None => last_genre(&ctx).ok_or_else(|| {
            Error::Other(
                "No genre given. Pick one from `cinetrack browse genres` and pass its ID."
                    .to_string(),
            )
        })?,
    };

    let client = ctx.client()?;
    let results = ctx
        .fetch(
            "Fetching movies in genre...",
            client.discover_by_genre(genre_id, page),
        )
        .await?;

    if let Err(e) = ctx
        .session_store
        .set(LAST_GENRE_KEY, &genre_id.to_string())
    {
        log::debug!("Could not remember genre {}: {}", genre_id, e);
    }

    print_page(&ctx, None, &results, false)
}

/// Run the browse genres command
pub async fn genres(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let client = ctx.client()?;
    let genres = ctx.fetch("Fetching genres...", client.genres()).await?;

    let rows: Vec<GenreDisplay> = genres.iter().map(GenreDisplay::from).collect();
    rows.print(ctx.format)
}

fn last_genre(ctx: &CommandContext) -> Option<i64> {
    ctx.session_store
        .get(LAST_GENRE_KEY)
        .ok()
        .flatten()
        .and_then(|raw| raw.trim().parse().ok())
}
