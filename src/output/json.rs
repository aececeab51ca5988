//! JSON envelope for script-friendly output
//!
//! Every JSON document is `{"data": ..., "meta": {...}}`. Listings also
//! carry `meta.count` so scripts can tell an empty page from a missing one.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
struct Envelope<'a, T: ?Sized> {
    data: &'a T,
    meta: Meta,
}

#[derive(Debug, Serialize)]
struct Meta {
    timestamp: DateTime<Utc>,
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
}

impl Meta {
    fn now(count: Option<usize>) -> Self {
        Self {
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION"),
            count,
        }
    }
}

fn render<T: Serialize + ?Sized>(data: &T, count: Option<usize>) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Envelope {
        data,
        meta: Meta::now(count),
    })
}

/// Wrap a single value in the envelope
pub fn format_json<T: Serialize + ?Sized>(data: &T) -> serde_json::Result<String> {
    render(data, None)
}

/// Wrap a list of rows, recording how many there are
pub fn format_json_list<T: Serialize>(rows: &[T]) -> serde_json::Result<String> {
    render(rows, Some(rows.len()))
}
