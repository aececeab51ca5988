//! Search history command implementations

use colored::Colorize;
use serde_json::json;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::error::{Error, Result};
use crate::models::HistoryDisplay;
use crate::output::{Formattable, json};

/// Run the history list command
pub fn list(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    HistoryDisplay::list(ctx.history().list()).print(ctx.format)
}

/// Run the history clear command
pub fn clear(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    ctx.history().clear();

    match ctx.format {
        OutputFormat::Json => println!("{}", json::format_json(&json!({ "cleared": true }))?),
        _ => println!("{} Search history cleared", "✓".green()),
    }
    Ok(())
}

/// Run the history select command; `position` is 1-based
pub fn select(opts: &GlobalOptions, position: u32) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let index = (position as usize).saturating_sub(1);

    let term = ctx.history().select(index).ok_or_else(|| {
        Error::Other(format!(
            "No search at position {}. See `cinetrack history list`.",
            position
        ))
    })?;

    match ctx.format {
        OutputFormat::Json => println!("{}", json::format_json(&json!({ "selected": term }))?),
        _ => {
            println!("{} Selected \"{}\"", "✓".green(), term);
            println!("  Run {} to search for it", "cinetrack search".cyan());
        }
    }
    Ok(())
}
