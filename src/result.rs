//! Search result types.

use serde::{Deserialize, Serialize};

/// A single raw result from a search backend.
///
/// Identity for deduplication purposes is the normalized URL; title and
/// snippet are carried along for the normalizer to mine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Result URL.
    pub url: String,
    /// Result title.
    pub title: String,
    /// Result description/snippet.
    pub snippet: String,
}

impl SearchResult {
    /// Creates a new search result.
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            snippet: snippet.into(),
        }
    }

    /// Returns a normalized URL for deduplication (without scheme and
    /// trailing slash, lowercased).
    pub fn normalized_url(&self) -> String {
        normalize_url(&self.url)
    }
}

/// Canonicalizes a URL into the dedup key used across the whole session.
pub fn normalize_url(url: &str) -> String {
    url.trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_lowercase()
}
