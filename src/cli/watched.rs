//! Watched list command implementations

use colored::Colorize;
use dialoguer::Confirm;
use log::debug;
use serde_json::json;

use crate::cli::args::GlobalOptions;
use crate::cli::search::resolve_movie;
use crate::cli::{CommandContext, OutputFormat};
use crate::error::{Error, Result};
use crate::identity::{ButtonState, MovieRef};
use crate::models::WatchedDisplay;
use crate::models::display::format_rating;
use crate::output::{Formattable, PrettyRow, json, table};
use crate::watched::{WatchedItem, WatchedPatch, WatchedStore};

fn find_item(store: &WatchedStore, reference: &str) -> Result<WatchedItem> {
    store.find(reference).ok_or_else(|| {
        Error::Other(format!(
            "No watched movie matches '{}'. See `cinetrack watched list`.",
            reference.trim()
        ))
    })
}

/// Print a single item after a change
fn print_item(ctx: &CommandContext, item: &WatchedItem, message: &str) -> Result<()> {
    match ctx.format {
        OutputFormat::Json => println!("{}", json::format_json(item)?),
        _ => println!("{} {}", "✓".green(), message),
    }
    Ok(())
}

/// Run the watched list command
pub fn list(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let rows: Vec<WatchedDisplay> = ctx.watched().list().iter().map(WatchedDisplay::from).collect();
    rows.print(ctx.format)
}

/// Run the watched show command
pub fn show(opts: &GlobalOptions, reference: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let item = find_item(&ctx.watched(), reference)?;

    match ctx.format {
        OutputFormat::Json => println!("{}", json::format_json(&item)?),
        OutputFormat::Table => {
            let fields = [
                ("ID", item.id.clone()),
                ("Title", item.title.clone()),
                ("Year", item.year.clone()),
                ("Rating", format_rating(item.rating)),
                ("Seen", WatchedDisplay::from(&item).seen),
                ("Poster", item.poster.clone()),
                ("Note", item.note.clone()),
            ];
            println!("{}", table::format_fields(&fields));
            if let Some(preview) = item.synopsis_preview() {
                println!("\n{}", preview);
            }
        }
        OutputFormat::Pretty => {
            print!("{}", WatchedDisplay::from(&item).pretty());
            match item.synopsis_preview() {
                Some(preview) => println!("\n{}", preview),
                None => println!(
                    "\n{} No synopsis yet. Fetch it with {}",
                    "○".dimmed(),
                    format!("cinetrack watched enrich {}", item.id).cyan()
                ),
            }
        }
    }
    Ok(())
}

/// Run the watched mark command
pub async fn mark(opts: &GlobalOptions, reference: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let movie = resolve_movie(&ctx, reference).await?;

    let item = ctx.watched().mark(&movie, ctx.now_ms());
    ctx.history().record(&movie.title);
    debug!("Marked {} as watched", item.id);

    print_item(
        &ctx,
        &item,
        &format!("Marked {} ({}) as watched", item.title.bold(), item.year),
    )
}

/// Run the watched rate command
pub fn rate(opts: &GlobalOptions, reference: &str, rating: f64) -> Result<()> {
    if !rating.is_finite() || !(0.0..=10.0).contains(&rating) {
        return Err(Error::Other(format!(
            "Rating must be between 0 and 10, got {}",
            rating
        )));
    }

    let ctx = CommandContext::new(opts)?;
    let store = ctx.watched();
    let item = find_item(&store, reference)?;
    let updated = store
        .update(
            &item.id,
            WatchedPatch {
                rating: Some(Some(rating)),
                ..WatchedPatch::default()
            },
        )
        .ok_or_else(|| Error::Other(format!("'{}' is no longer watched", item.id)))?;

    print_item(
        &ctx,
        &updated,
        &format!("Rated {} {}/10", updated.title.bold(), format_rating(updated.rating)),
    )
}

/// Run the watched note command
pub fn note(opts: &GlobalOptions, reference: &str, text: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let store = ctx.watched();
    let item = find_item(&store, reference)?;
    let updated = store
        .update(
            &item.id,
            WatchedPatch {
                note: Some(text.trim().to_string()),
                ..WatchedPatch::default()
            },
        )
        .ok_or_else(|| Error::Other(format!("'{}' is no longer watched", item.id)))?;

    let message = if updated.note.is_empty() {
        format!("Cleared the note on {}", updated.title.bold())
    } else {
        format!("Saved the note on {}", updated.title.bold())
    };
    print_item(&ctx, &updated, &message)
}

/// Run the watched remove command
pub fn remove(opts: &GlobalOptions, reference: &str, yes: bool) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let store = ctx.watched();
    let item = find_item(&store, reference)?;

    // Confirmation prompt unless --yes
    if !yes {
        eprintln!(
            "{} Remove \"{}\" ({}) from your watched list?",
            "⚠".yellow(),
            item.title,
            item.year
        );
        let confirm = Confirm::new()
            .with_prompt("Confirm removal?")
            .default(false)
            .interact()?;

        if !confirm {
            eprintln!("Cancelled.");
            return Ok(());
        }
    }

    let Some(removed) = store.remove_with_undo(&item.id, ctx.now_ms()) else {
        return Err(Error::Other(format!("'{}' is no longer watched", item.id)));
    };

    match ctx.format {
        OutputFormat::Json => {
            let output = json!({
                "removed": removed,
                "undo_window_secs": store.undo_window().as_secs(),
            });
            println!("{}", json::format_json(&output)?);
        }
        _ => {
            println!("{} Removed {}", "✓".green(), removed.title.bold());
            println!(
                "  Changed your mind? Run {} within {}s",
                "cinetrack watched undo".cyan(),
                store.undo_window().as_secs()
            );
        }
    }
    Ok(())
}

/// Run the watched undo command
pub fn undo(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;

    match ctx.watched().undo(ctx.now_ms()) {
        Some(item) => print_item(&ctx, &item, &format!("Restored {}", item.title.bold())),
        None => {
            match ctx.format {
                OutputFormat::Json => println!("{}", json::format_json(&json!(null))?),
                _ => println!("Nothing to undo."),
            }
            Ok(())
        }
    }
}

/// Run the watched check command
pub fn check(opts: &GlobalOptions, reference: &str) -> Result<()> {
    let parsed = MovieRef::parse(reference).ok_or_else(|| {
        Error::Other(format!("'{}' is not a movie id", reference.trim()))
    })?;

    let ctx = CommandContext::new(opts)?;
    let state = ctx.watched().button_state(&parsed.as_record());

    match ctx.format {
        OutputFormat::Json => {
            let output = json!({
                "id": reference.trim(),
                "watched": state == ButtonState::AlreadyWatched,
            });
            println!("{}", json::format_json(&output)?);
        }
        _ => match state {
            ButtonState::AlreadyWatched => println!("{} {} is watched", "✓".green(), reference.trim()),
            ButtonState::MarkAsWatched => {
                println!("{} {} is not watched", "○".dimmed(), reference.trim())
            }
        },
    }
    Ok(())
}

/// Run the watched enrich command
pub async fn enrich(opts: &GlobalOptions, reference: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let store = ctx.watched();
    let item = find_item(&store, reference)?;
    let client = ctx.client()?;

    let enriched = ctx
        .fetch(
            &format!("Fetching details for {}...", item.title),
            store.enrich(&item.id, client.as_ref()),
        )
        .await?
        .ok_or_else(|| Error::Other(format!("'{}' is no longer watched", item.id)))?;

    match ctx.format {
        OutputFormat::Json => println!("{}", json::format_json(&enriched)?),
        _ => {
            println!("{} Updated {}", "✓".green(), enriched.title.bold());
            if let Some(preview) = enriched.synopsis_preview() {
                println!("\n{}", preview);
            }
        }
    }
    Ok(())
}
