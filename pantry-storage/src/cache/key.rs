//! Cache key normalization.

use pantry_core::Store;

/// `store:query:page`, lowercased and trimmed, whitespace runs as `_`.
///
/// Queries that differ only in case or spacing share a key.
pub fn normalize_cache_key(store: Store, query: &str, page: u32) -> String {
    let query = query
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    format!("{}:{}:{}", store.as_str(), query, page)
}
