//! Human-oriented list output

/// A row that can render itself as a block of colored text
pub trait PrettyRow {
    fn pretty(&self) -> String;
}

/// One block per item, separated by blank lines
pub fn format_pretty<T: PrettyRow>(data: &[T]) -> String {
    if data.is_empty() {
        return "No results found.".to_string();
    }

    data.iter()
        .map(PrettyRow::pretty)
        .collect::<Vec<_>>()
        .join("\n")
}
