//! Search history display model

use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use crate::output::PrettyRow;

#[derive(Debug, Clone, Tabled, Serialize)]
pub struct HistoryDisplay {
    /// 1-based position, as accepted by `history select`
    #[tabled(rename = "#")]
    pub position: usize,

    #[tabled(rename = "SEARCH")]
    pub term: String,
}

impl HistoryDisplay {
    pub fn list(terms: Vec<String>) -> Vec<Self> {
        terms
            .into_iter()
            .enumerate()
            .map(|(i, term)| Self {
                position: i + 1,
                term,
            })
            .collect()
    }
}

impl PrettyRow for HistoryDisplay {
    fn pretty(&self) -> String {
        format!("{:>3}. {}", self.position.to_string().dimmed(), self.term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_positions_are_one_based() {
        let rows = HistoryDisplay::list(vec!["Heat".to_string(), "Alien".to_string()]);
        assert_eq!(rows[0].position, 1);
        assert_eq!(rows[1].term, "Alien");
    }
}
