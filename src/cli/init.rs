//! Init command implementation

use colored::Colorize;
use dialoguer::{Password, theme::ColorfulTheme};

use crate::cli::args::GlobalOptions;
use crate::client::{MovieApi, TmdbClient};
use crate::config::Config;
use crate::error::Result;

/// Run the init command
///
/// Prompts for a TMDB API key (unless one was passed with `--api-key`),
/// verifies it with a genre lookup and saves it.
pub async fn run(opts: &GlobalOptions) -> Result<()> {
    println!("{}", "Welcome to cinetrack!".bold().green());
    println!("Let's set up your TMDB access.\n");

    let api_key = match &opts.api_key {
        Some(key) => key.trim().to_string(),
        None => Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Enter your TMDB API key")
            .interact()?
            .trim()
            .to_string(),
    };

    let mut config = Config::load_or_default(opts.config_ref())?;
    config.api_key = Some(api_key.clone());
    if let Some(base) = &opts.api_base {
        config.api_base = Some(base.clone());
    }
    config.require_api_key()?;

    println!("\n{}", "Verifying key...".cyan());
    let client = TmdbClient::new(api_key, config.client_settings())?;
    let genres = client.genres().await?;
    println!(
        "{} Key accepted ({} genres available)",
        "✓".green(),
        genres.len()
    );

    config.save_at(opts.config_ref())?;

    let config_path = Config::resolve_path(opts.config_ref())?;
    println!(
        "\n{} Configuration saved to: {}",
        "✓".green(),
        config_path.display()
    );

    println!("\n{}", "You're all set! Try running:".bold());
    println!("  {} - Search for a movie", "cinetrack search \"heat\"".cyan());
    println!("  {} - Browse what's popular", "cinetrack browse popular".cyan());

    Ok(())
}
