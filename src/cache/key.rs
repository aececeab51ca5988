//! Search-term normalization and storage key generation

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Prefix shared by every query-cache key in the session store
pub const CACHE_PREFIX: &str = "movie:";

/// Fold a title for comparison: trim, strip diacritics, lower-case.
///
/// Diacritics are removed by decomposing to NFD and dropping combining marks,
/// so "Amélie" and "AMELIE" fold to the same string.
pub fn fold_title(raw: &str) -> String {
    raw.trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Normalize a raw search title into a cache key, or `None` when blank.
pub fn normalize_key(raw: &str) -> Option<String> {
    let folded = fold_title(raw);
    if folded.trim().is_empty() {
        None
    } else {
        Some(folded)
    }
}

/// Key under which a normalized term is stored in the session scope.
pub fn storage_key(normalized: &str) -> String {
    format!("{}{}", CACHE_PREFIX, urlencoding::encode(normalized))
}
