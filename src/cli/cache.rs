//! Cache management commands

use chrono::{DateTime, Local};

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::error::Result;
use crate::output::json;
use crate::store::{STORE_QUOTA_BYTES, SqliteStore};

fn format_ts(ts: Option<i64>) -> Option<String> {
    ts.and_then(DateTime::from_timestamp_millis).map(|d| {
        d.with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string()
    })
}

fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Show cache status/statistics
pub fn status(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let stats = ctx.query_cache().stats();
    let path = ctx.paths.session.display().to_string();
    let size = SqliteStore::open_at(&ctx.paths.session)
        .and_then(|store| store.size_bytes())
        .ok();

    match ctx.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "total_entries": stats.total_entries,
                "valid_entries": stats.valid_entries,
                "expired_entries": stats.expired_entries,
                "oldest_entry_timestamp": stats.oldest_ts,
                "newest_entry_timestamp": stats.newest_ts,
                "size_bytes": size,
                "quota_bytes": STORE_QUOTA_BYTES,
                "path": path,
            });
            println!("{}", json::format_json(&output)?);
        }
        _ => {
            println!("Cache Status");
            println!("────────────────────────────────────────");
            println!("Location:       {}", path);
            println!("Valid entries:  {}", stats.valid_entries);
            println!("Expired:        {}", stats.expired_entries);
            if let Some(size) = size {
                println!(
                    "Session size:   {} of {}",
                    format_size(size),
                    format_size(STORE_QUOTA_BYTES)
                );
            }

            if let Some(oldest) = format_ts(stats.oldest_ts) {
                println!("Oldest entry:   {}", oldest);
            }
            if let Some(newest) = format_ts(stats.newest_ts) {
                println!("Newest entry:   {}", newest);
            }
        }
    }

    Ok(())
}

/// Clear all cache entries
pub fn clear(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let removed = ctx.query_cache().clear();

    match ctx.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "entries_removed": removed,
                "success": true,
            });
            println!("{}", json::format_json(&output)?);
        }
        _ => {
            if removed > 0 {
                println!("Cleared {} cache entries", removed);
            } else {
                println!("Cache was already empty");
            }
        }
    }

    Ok(())
}

/// Show cache path
pub fn path() -> Result<()> {
    let paths = crate::store::StorePaths::resolve()?;
    println!("{}", paths.session.display());
    Ok(())
}
