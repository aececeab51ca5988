//! Search, suggest and show command implementations

use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::client::{Movie, MovieApi, SearchPage};
use crate::error::{ApiError, Result, SearchError};
use crate::identity::{self, ButtonState, MovieRef};
use crate::models::{MovieDisplay, SuggestionDisplay};
use crate::models::display::format_rating;
use crate::output::{Formattable, Spinner, json, table};
use crate::watched::WatchedItem;

/// JSON shape of a page of movies
#[derive(Serialize)]
struct PageJson<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    term: Option<&'a str>,
    page: u32,
    total_pages: u32,
    total_results: u32,
    from_cache: bool,
    results: Vec<MovieDisplay>,
}

/// Display rows for `movies`, flagging the ones already watched
pub fn movie_rows(movies: &[Movie], watched: &[WatchedItem]) -> Vec<MovieDisplay> {
    movies
        .iter()
        .map(|movie| {
            let record = serde_json::to_value(movie).unwrap_or(Value::Null);
            MovieDisplay::new(movie, identity::is_watched(&record, watched))
        })
        .collect()
}

/// Print one page of movies in the context's format
pub fn print_page(
    ctx: &CommandContext,
    term: Option<&str>,
    page: &SearchPage,
    from_cache: bool,
) -> Result<()> {
    let rows = movie_rows(&page.results, &ctx.watched().list());

    if ctx.format == OutputFormat::Json {
        let out = PageJson {
            term,
            page: page.page,
            total_pages: page.total_pages,
            total_results: page.total_results,
            from_cache,
            results: rows,
        };
        println!("{}", json::format_json(&out)?);
        return Ok(());
    }

    rows.print(ctx.format)?;
    if !page.results.is_empty() {
        let mut footer = format!(
            "Page {} of {} ({} results)",
            page.page,
            page.total_pages.max(1),
            page.total_results
        );
        if from_cache {
            footer.push_str(" · cached");
        }
        println!("{}", footer.dimmed());
    }
    Ok(())
}

/// Run the search command
///
/// Without a query, runs the search picked with `history select`.
pub async fn search(opts: &GlobalOptions, query: Option<String>, page: u32) -> Result<()> {
    let ctx = CommandContext::new(opts)?;

    let term = match query {
        Some(q) => q,
        None => ctx
            .history()
            .take_pending()
            .ok_or(SearchError::InputEmpty)?,
    };

    let session = ctx.session()?;
    let spinner = Spinner::start(format!("Searching for \"{}\"...", term.trim()), ctx.format);
    let outcome = session.search_page(&term, page).await;
    spinner.finish();
    let outcome = outcome?;

    print_page(&ctx, Some(&outcome.term), &outcome.page, outcome.from_cache)?;

    if outcome.from_cache {
        session.refresh(&outcome.term, &outcome.page).await;
    }
    Ok(())
}

/// Run the suggest command
pub async fn suggest(opts: &GlobalOptions, term: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let session = ctx.session()?;

    let suggestions = session.suggest(term).await;
    let rows: Vec<SuggestionDisplay> = suggestions.iter().map(SuggestionDisplay::from).collect();
    rows.print(ctx.format)?;
    Ok(())
}

/// Fetch a movie by a user-supplied reference
pub async fn resolve_movie(ctx: &CommandContext, reference: &str) -> Result<Movie> {
    let parsed = MovieRef::parse(reference).ok_or_else(|| {
        crate::error::Error::Other(format!(
            "'{}' is not a movie id. Use a catalog id like 603 or tmdb:603, or an IMDb id like tt0133093.",
            reference.trim()
        ))
    })?;

    let client = ctx.client()?;
    let message = format!("Fetching {}...", reference.trim());
    match parsed {
        MovieRef::Catalog(id) => ctx.fetch(&message, client.movie(id)).await,
        MovieRef::Legacy(imdb_id) => ctx
            .fetch(&message, client.find_by_external_id(&imdb_id))
            .await?
            .ok_or_else(|| ApiError::NotFound(imdb_id).into()),
    }
}

#[derive(Serialize)]
struct MovieDetail<'a> {
    #[serde(flatten)]
    movie: &'a Movie,
    status: ButtonState,
}

/// Run the show command
pub async fn show(opts: &GlobalOptions, reference: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let movie = resolve_movie(&ctx, reference).await?;

    let record = serde_json::to_value(&movie)?;
    let status = ctx.watched().button_state(&record);

    match ctx.format {
        OutputFormat::Json => {
            let detail = MovieDetail {
                movie: &movie,
                status,
            };
            println!("{}", json::format_json(&detail)?);
        }
        OutputFormat::Table => {
            let fields = [
                ("ID", movie.id.clone()),
                ("Title", movie.title.clone()),
                ("Year", movie.year.clone()),
                ("Rating", format_rating(movie.vote_average)),
                ("IMDb", movie.imdb_id.clone().unwrap_or_default()),
                ("Poster", movie.poster_or_placeholder().to_string()),
                ("Status", status.to_string()),
            ];
            println!("{}", table::format_fields(&fields));
            if !movie.overview.trim().is_empty() {
                println!("\n{}", movie.overview.trim());
            }
        }
        OutputFormat::Pretty => {
            println!("{} ({})", movie.title.bold(), movie.year);
            println!("  {}", movie.id.dimmed());
            if movie.vote_average.is_some() {
                println!("  {} {}", "★".yellow(), format_rating(movie.vote_average));
            }
            if let Some(imdb) = &movie.imdb_id {
                println!("  IMDb: {}", imdb);
            }
            println!("  Poster: {}", movie.poster_or_placeholder());
            match status {
                ButtonState::AlreadyWatched => println!("  {}", "✓ watched".green()),
                ButtonState::MarkAsWatched => println!(
                    "  {} mark it with {}",
                    "○".dimmed(),
                    format!("cinetrack watched mark {}", movie.id).cyan()
                ),
            }
            if !movie.overview.trim().is_empty() {
                println!("\n{}", movie.overview.trim());
            }
        }
    }
    Ok(())
}
