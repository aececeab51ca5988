//! Common display utilities and helpers

use chrono::{DateTime, Utc};

/// Truncate string to `max_len` characters with an ellipsis
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut.trim_end())
    }
}

/// Rating as `7.8`, or `--` when unset
pub fn format_rating(rating: Option<f64>) -> String {
    match rating {
        Some(r) if r > 0.0 => format!("{:.1}", r),
        _ => "--".to_string(),
    }
}

/// Format epoch milliseconds relative to now (e.g., "2h ago")
pub fn format_relative_time(timestamp_ms: i64) -> String {
    if timestamp_ms <= 0 {
        return "--".to_string();
    }
    let Some(then) = DateTime::from_timestamp_millis(timestamp_ms) else {
        return "--".to_string();
    };

    let duration = Utc::now().signed_duration_since(then);

    let seconds = duration.num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let minutes = duration.num_minutes();
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }

    let hours = duration.num_hours();
    if hours < 24 {
        return format!("{}h ago", hours);
    }

    let days = duration.num_days();
    if days < 30 {
        return format!("{}d ago", days);
    }

    then.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Heat", 10), "Heat");
        assert_eq!(truncate_string("Amélie Poulain", 8), "Amélie...");
    }

    #[test]
    fn test_format_rating() {
        assert_eq!(format_rating(Some(7.84)), "7.8");
        assert_eq!(format_rating(Some(0.0)), "--");
        assert_eq!(format_rating(None), "--");
    }

    #[test]
    fn test_format_relative_time() {
        let now = Utc::now().timestamp_millis();
        assert_eq!(format_relative_time(now), "just now");
        assert_eq!(format_relative_time(now - 2 * 3_600_000), "2h ago");
        assert_eq!(format_relative_time(now - 3 * 86_400_000), "3d ago");
        assert_eq!(format_relative_time(0), "--");
    }
}
