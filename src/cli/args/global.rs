//! Global CLI options shared across all commands

use crate::cli::{Cli, OutputFormat};

/// Global CLI options passed to all command handlers.
///
/// # Precedence
///
/// For most options, the precedence is: CLI flag > environment variable > config file > default.
/// This struct captures the CLI/env layer; config file defaults are resolved later in
/// `CommandContext`.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Output format, when given on the command line or in the environment
    pub format: Option<OutputFormat>,

    /// Custom config file path (defaults to ~/.cinetrack/config.yaml)
    pub config: Option<String>,

    /// API key override
    pub api_key: Option<String>,

    /// Metadata API base URL override
    pub api_base: Option<String>,

    /// Skip the session query cache
    pub no_cache: bool,
}

impl GlobalOptions {
    /// Create GlobalOptions from a parsed CLI struct.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            api_key: cli.api_key.clone(),
            api_base: cli.api_base.clone(),
            no_cache: cli.no_cache,
        }
    }

    /// Get config path as `Option<&str>`.
    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }
}
