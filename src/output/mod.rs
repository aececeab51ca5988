//! Output formatting for CLI results

use serde::Serialize;
use tabled::Tabled;

use crate::cli::OutputFormat;
use crate::error::Result;

pub mod json;
pub mod pretty;
pub mod progress;
pub mod table;

pub use pretty::PrettyRow;
pub use progress::Spinner;

/// Trait for types that can be formatted for output
pub trait Formattable {
    /// Format the data according to the specified format
    fn format(&self, format: OutputFormat) -> Result<String>;

    /// Format and print to stdout
    fn print(&self, format: OutputFormat) -> Result<()> {
        println!("{}", self.format(format)?);
        Ok(())
    }
}

impl<T> Formattable for Vec<T>
where
    T: Tabled + Serialize + PrettyRow,
{
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Pretty => Ok(pretty::format_pretty(self)),
            OutputFormat::Table => Ok(table::format_table(self)),
            OutputFormat::Json => Ok(json::format_json_list(self)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Tabled, Serialize)]
    struct Row {
        #[tabled(rename = "NAME")]
        name: String,
    }

    impl PrettyRow for Row {
        fn pretty(&self) -> String {
            format!("* {}", self.name)
        }
    }

    fn rows() -> Vec<Row> {
        vec![Row {
            name: "Heat".to_string(),
        }]
    }

    #[test]
    fn test_vec_formats_each_way() {
        let items = rows();
        assert!(items.format(OutputFormat::Table).unwrap().contains("NAME"));
        assert!(items.format(OutputFormat::Json).unwrap().contains("\"data\""));
        assert!(items.format(OutputFormat::Pretty).unwrap().contains("* Heat"));
    }
}
