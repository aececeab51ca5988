//! Common CLI types shared across commands

use clap::{Args, ValueEnum};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty format - human-optimized rich formatting (default)
    #[default]
    Pretty,
    /// Table format - one row per entry
    Table,
    /// JSON format - structured for scripts
    Json,
}

impl OutputFormat {
    /// Parse a preference value such as `table`; unknown values yield `None`
    pub fn from_preference(value: &str) -> Option<Self> {
        Self::from_str(value.trim(), true).ok()
    }
}

/// Result page selection for search and listing commands
#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// Result page (1-based)
    #[arg(long, short = 'p', default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_preference() {
        assert_eq!(OutputFormat::from_preference("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_preference(" table "), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::from_preference("xml"), None);
    }
}
