//! Platform adapters: query construction and result classification.

mod glassdoor;
mod linkedin;

use std::sync::Arc;

pub use glassdoor::Glassdoor;
pub use linkedin::LinkedIn;

use crate::record::ScrapedRecord;
use crate::result::SearchResult;

/// A content platform harvested through web search.
///
/// Adapters never talk to the network themselves; they turn a search term
/// into site-restricted queries and turn search results back into typed
/// records. Anything off-platform is rejected at classification time.
pub trait ContentSource: Send + Sync {
    /// Platform name, recorded on every record it produces.
    fn name(&self) -> &str;

    /// Site-restricted search queries for one term.
    fn queries(&self, term: &str) -> Vec<String>;

    /// Classifies one search result into a record, or `None` when the
    /// result does not belong to this platform.
    fn classify(&self, result: &SearchResult) -> Option<ScrapedRecord>;
}

/// All known platforms. Extending the harvester to a new platform means
/// one new adapter here, nothing else.
pub fn registry() -> Vec<Arc<dyn ContentSource>> {
    vec![Arc::new(LinkedIn), Arc::new(Glassdoor)]
}
