//! Status command implementation

use colored::Colorize;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::config::Config;
use crate::error::Result;
use crate::output::json;
use crate::store::StorePaths;

#[derive(Serialize)]
struct StatusReport {
    config_path: String,
    config_found: bool,
    api_key_configured: bool,
    api_base: Option<String>,
    language: String,
    session_store: String,
    durable_store: String,
}

/// Run the status command to display configuration status
pub fn run(opts: &GlobalOptions) -> Result<()> {
    let config_path = Config::resolve_path(opts.config_ref())?;
    let loaded = Config::load_from(config_path.clone());
    let config_found = loaded.is_ok();
    let config = loaded.unwrap_or_default();
    let paths = StorePaths::resolve()?;

    let api_key_configured = opts.api_key.is_some() || config.require_api_key().is_ok();
    let format = opts.format.unwrap_or_else(|| {
        config
            .preferences
            .format
            .as_deref()
            .and_then(OutputFormat::from_preference)
            .unwrap_or_default()
    });

    let report = StatusReport {
        config_path: config_path.display().to_string(),
        config_found,
        api_key_configured,
        api_base: opts.api_base.clone().or(config.api_base.clone()),
        language: config.preferences.language.clone(),
        session_store: paths.session.display().to_string(),
        durable_store: paths.durable.display().to_string(),
    };

    if format == OutputFormat::Json {
        println!("{}", json::format_json(&report)?);
        return Ok(());
    }

    println!("{}\n", "cinetrack Status".bold());
    println!("Config file: {}", report.config_path.cyan());
    if !report.config_found {
        println!("{} Configuration not found", "○".dimmed());
    }

    if report.api_key_configured {
        println!("{} API key configured", "✓".green());
    } else {
        println!("{} API key not configured", "✗".red());
        println!("  → Run 'cinetrack init' to configure");
    }

    if let Some(base) = &report.api_base {
        println!("{} Custom API base: {}", "○".dimmed(), base.cyan());
    }
    println!("{} Language: {}", "○".dimmed(), report.language);

    println!();
    println!("Session store: {}", report.session_store.dimmed());
    println!("Durable store: {}", report.durable_store.dimmed());
    println!();

    Ok(())
}
